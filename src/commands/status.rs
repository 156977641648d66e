use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::jobs::{SqliteJobStore, job_status};
use crate::ocr::tool_versions;
use crate::store::{count_rows, open_database};
use crate::util::write_json_stdout;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args.database.resolved_db_path();

    if let (Some(job_id), Some(owner)) = (&args.job_id, &args.owner) {
        let store = SqliteJobStore::open(&db_path)?;
        let view = job_status(&store, job_id, owner)?;
        return write_json_stdout(&view);
    }

    info!(cache_root = %args.database.cache_root.display(), "status requested");

    if db_path.exists() {
        let connection = open_database(&db_path)?;
        info!(
            path = %db_path.display(),
            centers = query_count(&connection, "SELECT COUNT(*) FROM centers"),
            voters = query_count(&connection, "SELECT COUNT(*) FROM voters"),
            jobs_processing = query_count(
                &connection,
                "SELECT COUNT(*) FROM import_jobs WHERE status = 'processing'"
            ),
            jobs_done = query_count(
                &connection,
                "SELECT COUNT(*) FROM import_jobs WHERE status = 'done'"
            ),
            jobs_failed = query_count(
                &connection,
                "SELECT COUNT(*) FROM import_jobs WHERE status = 'failed'"
            ),
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    let versions = tool_versions();
    info!(
        pdftotext = %versions.pdftotext.as_deref().unwrap_or("missing"),
        pdftoppm = %versions.pdftoppm.as_deref().unwrap_or("missing"),
        tesseract = %versions.tesseract.as_deref().unwrap_or("missing"),
        "external tools"
    );
    if versions.pdftoppm.is_none() || versions.tesseract.is_none() {
        warn!("scanned documents cannot be imported until pdftoppm and tesseract are installed");
    }

    Ok(())
}

fn query_count(connection: &Connection, sql: &str) -> i64 {
    count_rows(connection, sql).unwrap_or(0)
}
