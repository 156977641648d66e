use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{ExtractionConfig, OcrConfig};

pub const DEFAULT_DB_FILE_NAME: &str = "voterroll.sqlite";

#[derive(Parser, Debug)]
#[command(
    name = "voterroll",
    version,
    about = "Bengali voter roll extraction and import tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Import(ImportArgs),
    Status(StatusArgs),
    Manual(ManualArgs),
    Save(SaveArgs),
    #[command(subcommand)]
    Center(CenterCommands),
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    #[arg(long, default_value = ".cache/voterroll")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

impl DatabaseArgs {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.cache_root.join(DEFAULT_DB_FILE_NAME))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum JobStoreKind {
    Memory,
    Sqlite,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub center: String,

    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub save: bool,

    #[arg(long, value_enum, default_value_t = JobStoreKind::Sqlite)]
    pub job_store: JobStoreKind,

    #[arg(long, default_value = "ben")]
    pub ocr_lang: String,

    #[arg(long, default_value_t = 300)]
    pub dpi: u32,

    #[arg(long, default_value_t = 120)]
    pub ocr_timeout_secs: u64,

    #[arg(long, default_value_t = 600)]
    pub render_timeout_secs: u64,

    #[command(flatten)]
    pub extraction: ExtractionArgs,
}

impl ImportArgs {
    pub fn ocr_config(&self) -> OcrConfig {
        OcrConfig {
            lang: self.ocr_lang.clone(),
            dpi: self.dpi,
            recognize_timeout: Duration::from_secs(self.ocr_timeout_secs),
            render_timeout: Duration::from_secs(self.render_timeout_secs),
            ..OcrConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractionArgs {
    #[arg(long, default_value_t = 10)]
    pub label_penalty: i64,

    #[arg(long, default_value_t = 100)]
    pub min_script_chars: usize,
}

impl ExtractionArgs {
    pub fn config(&self) -> ExtractionConfig {
        ExtractionConfig {
            label_penalty: self.label_penalty,
            min_text_layer_script_chars: self.min_script_chars,
            ..ExtractionConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long, requires = "owner")]
    pub job_id: Option<String>,

    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ManualArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub center: String,

    #[arg(long)]
    pub text: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub extraction: ExtractionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SaveArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub center: String,

    #[arg(long)]
    pub records: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CenterCommands {
    Add(CenterAddArgs),
    List(CenterListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CenterAddArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct CenterListArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long)]
    pub owner: String,
}
