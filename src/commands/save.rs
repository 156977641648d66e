use anyhow::Result;
use serde::Deserialize;

use crate::cli::SaveArgs;
use crate::model::{FinalRecord, ImportResult, ManualResult};
use crate::store::{open_database, persist_records};
use crate::util::{read_json, write_json_stdout};

/// A bare record list, an import result, a whole `import` output file, or
/// `manual` output.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Records(Vec<FinalRecord>),
    ImportOutput { data: ImportResult },
    ImportResult(ImportResult),
    Manual(ManualResult),
}

impl RecordsFile {
    fn into_records(self) -> Vec<FinalRecord> {
        match self {
            Self::Records(records) => records,
            Self::ImportOutput { data } | Self::ImportResult(data) => data.records,
            Self::Manual(manual) => manual.records,
        }
    }
}

pub fn run(args: SaveArgs) -> Result<()> {
    let records = read_json::<RecordsFile>(&args.records)?.into_records();

    let mut connection = open_database(&args.database.resolved_db_path())?;
    let summary = persist_records(&mut connection, &args.owner, &args.center, &records)?;
    write_json_stdout(&summary)
}
