use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ImportError;
use crate::model::{Center, FinalRecord, PersistSummary};
use crate::util::now_utc_string;

pub const INSERT_BATCH_SIZE: usize = 500;

/// Stored in place of a name the extractor could not recover.
pub const UNKNOWN_NAME: &str = "\u{0985}\u{099C}\u{09BE}\u{09A8}\u{09BE}";

pub fn create_center(connection: &Connection, owner_id: &str, name: &str) -> Result<Center, ImportError> {
    let name = name.trim();
    if owner_id.trim().is_empty() || name.is_empty() {
        return Err(ImportError::Validation(
            "owner and center name are required".to_string(),
        ));
    }

    let center = Center {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        name: name.to_string(),
        total_voters: 0,
        created_at: now_utc_string(),
    };

    connection
        .execute(
            "INSERT INTO centers(center_id, owner_id, name, total_voters, created_at)
             VALUES(?1, ?2, ?3, ?4, ?5)",
            params![
                center.id,
                center.owner_id,
                center.name,
                center.total_voters,
                center.created_at
            ],
        )
        .context("failed to insert center")?;

    info!(center_id = %center.id, owner_id = %center.owner_id, "center created");
    Ok(center)
}

/// The center, if it exists and belongs to `owner_id`. A center owned by
/// someone else is reported exactly like a missing one.
pub fn find_owned_center(
    connection: &Connection,
    owner_id: &str,
    center_id: &str,
) -> Result<Center, ImportError> {
    connection
        .query_row(
            "SELECT center_id, owner_id, name, total_voters, created_at
             FROM centers WHERE center_id = ?1 AND owner_id = ?2",
            params![center_id, owner_id],
            center_from_row,
        )
        .optional()?
        .ok_or_else(|| ImportError::NotFound(format!("center {center_id}")))
}

pub fn list_centers(connection: &Connection, owner_id: &str) -> Result<Vec<Center>, ImportError> {
    let mut statement = connection.prepare(
        "SELECT center_id, owner_id, name, total_voters, created_at
         FROM centers WHERE owner_id = ?1 ORDER BY created_at, name",
    )?;
    let centers = statement
        .query_map(params![owner_id], center_from_row)?
        .collect::<rusqlite::Result<Vec<Center>>>()?;
    Ok(centers)
}

fn center_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Center> {
    Ok(Center {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        total_voters: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Inserts `records` into the center in batches. Each batch is its own
/// transaction; a row the database rejects is skipped and reported while the
/// rest of the batch still lands.
pub fn persist_records(
    connection: &mut Connection,
    owner_id: &str,
    center_id: &str,
    records: &[FinalRecord],
) -> Result<PersistSummary, ImportError> {
    if records.is_empty() {
        return Err(ImportError::Validation(
            "no records supplied to save".to_string(),
        ));
    }
    find_owned_center(connection, owner_id, center_id)?;

    let created_at = now_utc_string();
    let mut inserted = 0;
    let mut errors = Vec::new();

    for (batch_index, batch) in records.chunks(INSERT_BATCH_SIZE).enumerate() {
        let tx = connection.transaction()?;
        {
            let mut statement = tx.prepare(
                "
                INSERT INTO voters(
                  center_id, owner_id, serial_no, cr, voter_no, nid, name,
                  father_name, mother_name, husband_name, gender, occupation,
                  date_of_birth, address, area, created_at
                )
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                ",
            )?;

            for (offset, record) in batch.iter().enumerate() {
                let position = batch_index * INSERT_BATCH_SIZE + offset;
                let serial_no = if record.serial_no == 0 {
                    (position + 1) as u32
                } else {
                    record.serial_no
                };
                let name = if record.name.trim().is_empty() {
                    UNKNOWN_NAME
                } else {
                    record.name.as_str()
                };

                let outcome = statement.execute(params![
                    center_id,
                    owner_id,
                    serial_no,
                    record.cr,
                    record.voter_no,
                    record.nid,
                    name,
                    record.father_name,
                    record.mother_name,
                    record.husband_name,
                    record.gender.as_str(),
                    record.occupation,
                    record.date_of_birth,
                    record.address,
                    record.area,
                    created_at
                ]);

                match outcome {
                    Ok(_) => inserted += 1,
                    Err(err) => {
                        warn!(serial_no, error = %err, "voter row rejected");
                        errors.push(format!("record {serial_no}: {err}"));
                    }
                }
            }
        }
        tx.commit()?;
    }

    refresh_voter_count(connection, center_id)?;

    info!(
        center_id,
        inserted,
        total = records.len(),
        rejected = errors.len(),
        "voter records saved"
    );

    Ok(PersistSummary {
        inserted,
        total: records.len(),
        errors: if errors.is_empty() { None } else { Some(errors) },
    })
}

pub fn refresh_voter_count(connection: &Connection, center_id: &str) -> Result<i64, ImportError> {
    connection.execute(
        "UPDATE centers
         SET total_voters = (SELECT COUNT(*) FROM voters WHERE voters.center_id = centers.center_id)
         WHERE center_id = ?1",
        params![center_id],
    )?;

    let total = connection.query_row(
        "SELECT total_voters FROM centers WHERE center_id = ?1",
        params![center_id],
        |row| row.get(0),
    )?;
    Ok(total)
}
