mod db_setup;
mod records;
#[cfg(test)]
mod tests;

pub use db_setup::{count_rows, open_database};
pub use records::{create_center, find_owned_center, list_centers, persist_records};
