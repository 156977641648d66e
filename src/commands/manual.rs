use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ManualArgs;
use crate::extract::RecordExtractor;
use crate::model::ManualResult;
use crate::store::{find_owned_center, open_database};
use crate::util::{write_json_pretty, write_json_stdout};

/// Pasted roll text for one of the owner's centers; form feeds separate
/// pages. Nothing is saved.
pub fn run(args: ManualArgs) -> Result<()> {
    let connection = open_database(&args.database.resolved_db_path())?;
    let center = find_owned_center(&connection, &args.owner, &args.center)?;

    let text = fs::read_to_string(&args.text)
        .with_context(|| format!("failed to read {}", args.text.display()))?;

    let extractor = RecordExtractor::new(args.extraction.config())?;
    let records = extractor.extract_pasted(text.split('\u{000C}'));
    let result = ManualResult {
        total_extracted: records.len(),
        records,
    };

    info!(
        records = result.total_extracted,
        center = %center.name,
        source = %args.text.display(),
        "manual extraction complete"
    );

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &result)?;
            info!(path = %path.display(), "wrote extracted records");
            Ok(())
        }
        None => write_json_stdout(&result),
    }
}
