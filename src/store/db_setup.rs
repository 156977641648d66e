use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::util::{ensure_directory, now_utc_string};

pub const DB_SCHEMA_VERSION: &str = "1";

pub fn open_database(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign_keys")?;
    connection
        .busy_timeout(std::time::Duration::from_secs(5))
        .context("failed to set busy timeout")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS centers (
          center_id TEXT PRIMARY KEY,
          owner_id TEXT NOT NULL,
          name TEXT NOT NULL,
          total_voters INTEGER NOT NULL DEFAULT 0,
          created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_centers_owner ON centers(owner_id);

        CREATE TABLE IF NOT EXISTS voters (
          voter_id INTEGER PRIMARY KEY AUTOINCREMENT,
          center_id TEXT NOT NULL,
          owner_id TEXT NOT NULL,
          serial_no INTEGER NOT NULL,
          cr TEXT NOT NULL DEFAULT '',
          voter_no TEXT NOT NULL DEFAULT '',
          nid TEXT NOT NULL DEFAULT '',
          name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 200),
          father_name TEXT NOT NULL DEFAULT '',
          mother_name TEXT NOT NULL DEFAULT '',
          husband_name TEXT NOT NULL DEFAULT '',
          gender TEXT NOT NULL DEFAULT 'unknown',
          occupation TEXT NOT NULL DEFAULT '',
          date_of_birth TEXT NOT NULL DEFAULT '',
          address TEXT NOT NULL DEFAULT '',
          area TEXT NOT NULL DEFAULT '',
          created_at TEXT NOT NULL,
          FOREIGN KEY(center_id) REFERENCES centers(center_id)
        );

        CREATE INDEX IF NOT EXISTS idx_voters_center ON voters(center_id, serial_no);

        CREATE TABLE IF NOT EXISTS import_jobs (
          job_id TEXT PRIMARY KEY,
          owner_id TEXT NOT NULL,
          target_center_id TEXT NOT NULL,
          status TEXT NOT NULL,
          progress_json TEXT NOT NULL,
          result_json TEXT,
          error TEXT,
          started_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_import_jobs_one_processing
          ON import_jobs(owner_id, target_center_id)
          WHERE status = 'processing';
        ",
        )
        .context("failed to create database schema")?;

    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;
    connection
        .execute(
            "INSERT OR IGNORE INTO metadata(key, value) VALUES('created_at', ?1)",
            params![now_utc_string()],
        )
        .context("failed to record database creation time")?;

    Ok(())
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to run count query: {sql}"))?;
    Ok(count)
}
