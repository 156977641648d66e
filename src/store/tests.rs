use rusqlite::Connection;

use super::records::{INSERT_BATCH_SIZE, UNKNOWN_NAME, refresh_voter_count};
use super::*;
use crate::error::ImportError;
use crate::model::{FinalRecord, Gender};

fn open_temp() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().expect("temp dir");
    let connection = open_database(&dir.path().join("db").join("voterroll.sqlite"))
        .expect("database should open");
    (dir, connection)
}

fn voter(serial_no: u32, name: &str) -> FinalRecord {
    FinalRecord {
        serial_no,
        cr: serial_no.to_string(),
        name: name.to_string(),
        gender: Gender::Female,
        ..FinalRecord::default()
    }
}

#[test]
fn open_database_is_repeatable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("voterroll.sqlite");
    drop(open_database(&path).expect("first open"));
    let connection = open_database(&path).expect("second open");

    let version: String = connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .expect("schema version recorded");
    assert_eq!(version, "1");
}

#[test]
fn centers_are_scoped_to_their_owner() {
    let (_dir, connection) = open_temp();
    let center = create_center(&connection, "owner-a", "Ward 4").expect("center created");

    let found = find_owned_center(&connection, "owner-a", &center.id).expect("owner sees center");
    assert_eq!(found.name, "Ward 4");

    let err = find_owned_center(&connection, "owner-b", &center.id).expect_err("hidden");
    assert!(matches!(err, ImportError::NotFound(_)));
    assert!(list_centers(&connection, "owner-b").expect("list").is_empty());
    assert_eq!(list_centers(&connection, "owner-a").expect("list").len(), 1);
}

#[test]
fn create_center_requires_a_name() {
    let (_dir, connection) = open_temp();
    let err = create_center(&connection, "owner-a", "   ").expect_err("blank name");
    assert!(matches!(err, ImportError::Validation(_)));
}

#[test]
fn persist_records_rejects_empty_input() {
    let (_dir, mut connection) = open_temp();
    let center = create_center(&connection, "owner-a", "Ward 4").expect("center created");

    let err = persist_records(&mut connection, "owner-a", &center.id, &[]).expect_err("empty");
    assert!(matches!(err, ImportError::Validation(_)));
}

#[test]
fn persist_records_skips_rejected_rows_and_keeps_the_rest() {
    let (_dir, mut connection) = open_temp();
    let center = create_center(&connection, "owner-a", "Ward 4").expect("center created");
    let too_long = "ক".repeat(300);
    let records = vec![voter(1, "রহিম"), voter(2, &too_long), voter(3, "করিম")];

    let summary =
        persist_records(&mut connection, "owner-a", &center.id, &records).expect("partial save");

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.total, 3);
    let errors = summary.errors.expect("one row rejected");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("record 2:"));

    let center = find_owned_center(&connection, "owner-a", &center.id).expect("center");
    assert_eq!(center.total_voters, 2);
}

#[test]
fn persist_records_applies_defaults() {
    let (_dir, mut connection) = open_temp();
    let center = create_center(&connection, "owner-a", "Ward 4").expect("center created");
    let records = vec![voter(0, ""), voter(7, "সালমা")];

    let summary =
        persist_records(&mut connection, "owner-a", &center.id, &records).expect("saved");
    assert_eq!(summary.errors, None);

    let rows = connection
        .prepare("SELECT serial_no, name, gender FROM voters ORDER BY serial_no")
        .expect("prepare")
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .expect("query")
        .collect::<rusqlite::Result<Vec<_>>>()
        .expect("rows");

    assert_eq!(
        rows,
        vec![
            (1, UNKNOWN_NAME.to_string(), "female".to_string()),
            (7, "সালমা".to_string(), "female".to_string()),
        ]
    );
}

#[test]
fn persist_records_spans_batches() {
    let (_dir, mut connection) = open_temp();
    let center = create_center(&connection, "owner-a", "Ward 4").expect("center created");
    let records = (1..=(INSERT_BATCH_SIZE as u32 + 20))
        .map(|serial| voter(serial, "রহিম"))
        .collect::<Vec<FinalRecord>>();

    let summary =
        persist_records(&mut connection, "owner-a", &center.id, &records).expect("saved");
    assert_eq!(summary.inserted, records.len());
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM voters").expect("count"),
        records.len() as i64
    );
}

#[test]
fn persist_records_refuses_foreign_center() {
    let (_dir, mut connection) = open_temp();
    let center = create_center(&connection, "owner-a", "Ward 4").expect("center created");

    let err = persist_records(&mut connection, "owner-b", &center.id, &[voter(1, "রহিম")])
        .expect_err("foreign center");
    assert!(matches!(err, ImportError::NotFound(_)));
    assert_eq!(refresh_voter_count(&connection, &center.id).expect("count"), 0);
}
