pub mod center;
pub mod import;
pub mod manual;
pub mod save;
pub mod status;
