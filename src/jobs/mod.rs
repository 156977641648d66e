mod pipeline;
mod store;
mod tracker;

pub use pipeline::OcrPipeline;
pub use store::{JobStore, MemoryJobStore, SqliteJobStore};
pub use tracker::{DocumentPipeline, JobTracker, job_status};
