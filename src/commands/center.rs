use anyhow::Result;

use crate::cli::CenterCommands;
use crate::store::{create_center, list_centers, open_database};
use crate::util::write_json_stdout;

pub fn run(command: CenterCommands) -> Result<()> {
    match command {
        CenterCommands::Add(args) => {
            let connection = open_database(&args.database.resolved_db_path())?;
            let center = create_center(&connection, &args.owner, &args.name)?;
            write_json_stdout(&center)
        }
        CenterCommands::List(args) => {
            let connection = open_database(&args.database.resolved_db_path())?;
            let centers = list_centers(&connection, &args.owner)?;
            write_json_stdout(&centers)
        }
    }
}
