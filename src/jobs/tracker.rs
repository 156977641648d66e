use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use super::store::JobStore;
use crate::error::ImportError;
use crate::model::{ImportResult, JobProgress, JobStatus, JobStatusView};

const PDF_MAGIC: &[u8] = b"%PDF-";
const DOCUMENT_FILE_NAME: &str = "document.pdf";

/// Turns one document into records. `progress` is called as pages finish.
pub trait DocumentPipeline: Send + Sync {
    fn run(
        &self,
        document: &Path,
        work_dir: &Path,
        progress: &mut dyn FnMut(JobProgress),
    ) -> Result<ImportResult>;
}

/// Handed to callers with every job. Nothing in the pipeline observes it, so
/// cancelling does not stop a running job.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct JobHandle {
    pub job_id: String,
    pub progress: Receiver<JobProgress>,
    pub cancel: CancellationToken,
    result: JoinHandle<JobStatus>,
}

impl JobHandle {
    /// Blocks until the job reaches a terminal state.
    pub fn wait(self) -> JobStatus {
        self.result.join().unwrap_or(JobStatus::Failed)
    }
}

pub struct JobTracker {
    store: Arc<dyn JobStore>,
    pipeline: Arc<dyn DocumentPipeline>,
}

impl JobTracker {
    pub fn new(store: Arc<dyn JobStore>, pipeline: Arc<dyn DocumentPipeline>) -> Self {
        Self { store, pipeline }
    }

    /// Registers a job and starts it on its own thread. Returns as soon as
    /// the job exists.
    pub fn submit(
        &self,
        owner_id: &str,
        center_id: &str,
        document: Vec<u8>,
    ) -> Result<JobHandle, ImportError> {
        if owner_id.trim().is_empty() || center_id.trim().is_empty() {
            return Err(ImportError::Validation(
                "owner and target center are required".to_string(),
            ));
        }
        if document.is_empty() {
            return Err(ImportError::Validation("no document uploaded".to_string()));
        }
        if !document.starts_with(PDF_MAGIC) {
            return Err(ImportError::Validation(
                "only PDF documents can be imported".to_string(),
            ));
        }

        let job = self.store.create_if_idle(owner_id, center_id)?;
        info!(job_id = %job.id, owner_id, center_id, "import job created");

        match self.spawn(&job.id, document) {
            Ok(handle) => Ok(handle),
            Err(err) => {
                let message = format!("{err:#}");
                if let Err(store_err) = self.store.fail(&job.id, &message) {
                    error!(job_id = %job.id, error = %store_err, "failed to record job failure");
                }
                Err(ImportError::Other(err))
            }
        }
    }

    fn spawn(&self, job_id: &str, document: Vec<u8>) -> Result<JobHandle> {
        let work_dir = tempfile::Builder::new()
            .prefix("voterroll-import-")
            .tempdir()
            .context("failed to create import working directory")?;
        let document_path = work_dir.path().join(DOCUMENT_FILE_NAME);
        fs::write(&document_path, &document)
            .with_context(|| format!("failed to stage {}", document_path.display()))?;
        drop(document);

        let (sender, receiver) = mpsc::channel();
        let store = Arc::clone(&self.store);
        let pipeline = Arc::clone(&self.pipeline);
        let task_job_id = job_id.to_string();
        let cancel = CancellationToken::default();
        let task_cancel = cancel.clone();

        let result = thread::Builder::new()
            .name(format!("import-{job_id}"))
            .spawn(move || {
                let mut report = |progress: JobProgress| {
                    if let Err(err) = store.update_progress(&task_job_id, &progress) {
                        warn!(job_id = %task_job_id, error = %err, "failed to record progress");
                    }
                    let _ = sender.send(progress);
                };

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    report(JobProgress::stage("ocr", 0, 0));
                    pipeline.run(&document_path, work_dir.path(), &mut report)
                }));

                let status = finish(store.as_ref(), &task_job_id, outcome);
                if task_cancel.is_cancelled() {
                    warn!(job_id = %task_job_id, "cancellation was requested; the job ran to completion");
                }
                if let Err(err) = work_dir.close() {
                    warn!(job_id = %task_job_id, error = %err, "failed to remove working directory");
                }
                status
            })
            .context("failed to start import thread")?;

        Ok(JobHandle {
            job_id: job_id.to_string(),
            progress: receiver,
            cancel,
            result,
        })
    }

    /// What `owner_id` may see of a job. Someone else's job is reported as
    /// missing.
    pub fn status(&self, job_id: &str, owner_id: &str) -> Result<JobStatusView, ImportError> {
        job_status(self.store.as_ref(), job_id, owner_id)
    }
}

pub fn job_status(
    store: &dyn JobStore,
    job_id: &str,
    owner_id: &str,
) -> Result<JobStatusView, ImportError> {
    match store.get(job_id)? {
        Some(job) if job.owner_id == owner_id => Ok(job.into()),
        _ => Err(ImportError::NotFound(format!("job {job_id}"))),
    }
}

fn finish(
    store: &dyn JobStore,
    job_id: &str,
    outcome: std::thread::Result<Result<ImportResult>>,
) -> JobStatus {
    let recorded = match outcome {
        Ok(Ok(result)) if result.records.is_empty() => {
            let message = ImportError::ExtractionEmpty.to_string();
            warn!(job_id, "import finished without records");
            store.fail(job_id, &message).map(|_| JobStatus::Failed)
        }
        Ok(Ok(result)) => {
            info!(
                job_id,
                records = result.total_extracted,
                pages = result.total_pages,
                method = result.method.as_str(),
                "import job done"
            );
            store.complete(job_id, &result).map(|_| JobStatus::Done)
        }
        Ok(Err(err)) => {
            let message = format!("{err:#}");
            error!(job_id, error = %message, "import job failed");
            store.fail(job_id, &message).map(|_| JobStatus::Failed)
        }
        Err(payload) => {
            let message = format!("import task panicked: {}", panic_message(payload.as_ref()));
            error!(job_id, error = %message, "import job failed");
            store.fail(job_id, &message).map(|_| JobStatus::Failed)
        }
    };

    recorded.unwrap_or_else(|err| {
        error!(job_id, error = %err, "failed to record final job state");
        JobStatus::Failed
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
