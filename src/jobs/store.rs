use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;
use uuid::Uuid;

use crate::error::ImportError;
use crate::model::{ImportJob, ImportResult, JobProgress, JobStatus};
use crate::store::open_database;
use crate::util::{now_utc_string, utc_string_before};

pub const INTERRUPTED_JOB_ERROR: &str = "import was interrupted before it finished";

/// Where job state lives. Terminal jobs are final: `update_progress`,
/// `complete` and `fail` return `false` instead of touching them.
pub trait JobStore: Send + Sync {
    /// Creates a `processing` job unless one is already running for the same
    /// owner and center.
    fn create_if_idle(&self, owner_id: &str, center_id: &str) -> Result<ImportJob, ImportError>;

    fn get(&self, job_id: &str) -> Result<Option<ImportJob>, ImportError>;

    fn update_progress(&self, job_id: &str, progress: &JobProgress) -> Result<bool, ImportError>;

    fn complete(&self, job_id: &str, result: &ImportResult) -> Result<bool, ImportError>;

    fn fail(&self, job_id: &str, error: &str) -> Result<bool, ImportError>;
}

fn new_job(owner_id: &str, center_id: &str) -> ImportJob {
    let now = now_utc_string();
    ImportJob {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        target_center_id: center_id.to_string(),
        status: JobStatus::Processing,
        progress: JobProgress::stage("starting", 0, 0),
        result: None,
        error: None,
        started_at: now.clone(),
        updated_at: now,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ImportError> {
    mutex
        .lock()
        .map_err(|_| ImportError::Other(anyhow!("job store lock poisoned")))
}

/// Process-local job state; lost on restart.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<String, ImportJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn transition(
        &self,
        job_id: &str,
        apply: impl FnOnce(&mut ImportJob),
    ) -> Result<bool, ImportError> {
        let mut jobs = lock(&self.jobs)?;
        let Some(job) = jobs.get_mut(job_id) else {
            return Err(ImportError::NotFound(format!("job {job_id}")));
        };
        if job.status.is_terminal() {
            return Ok(false);
        }

        apply(job);
        job.updated_at = now_utc_string();
        Ok(true)
    }
}

impl JobStore for MemoryJobStore {
    fn create_if_idle(&self, owner_id: &str, center_id: &str) -> Result<ImportJob, ImportError> {
        let mut jobs = lock(&self.jobs)?;
        if let Some(existing) = jobs.values().find(|job| {
            job.status == JobStatus::Processing
                && job.owner_id == owner_id
                && job.target_center_id == center_id
        }) {
            return Err(ImportError::Conflict {
                existing_job_id: existing.id.clone(),
            });
        }

        let job = new_job(owner_id, center_id);
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn get(&self, job_id: &str) -> Result<Option<ImportJob>, ImportError> {
        Ok(lock(&self.jobs)?.get(job_id).cloned())
    }

    fn update_progress(&self, job_id: &str, progress: &JobProgress) -> Result<bool, ImportError> {
        self.transition(job_id, |job| job.progress = progress.clone())
    }

    fn complete(&self, job_id: &str, result: &ImportResult) -> Result<bool, ImportError> {
        self.transition(job_id, |job| {
            job.status = JobStatus::Done;
            job.result = Some(result.clone());
        })
    }

    fn fail(&self, job_id: &str, error: &str) -> Result<bool, ImportError> {
        self.transition(job_id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error.to_string());
        })
    }
}

/// Job state in the `import_jobs` table; survives restarts.
pub struct SqliteJobStore {
    connection: Mutex<Connection>,
}

impl SqliteJobStore {
    pub fn open(db_path: &Path) -> Result<Self, ImportError> {
        Ok(Self {
            connection: Mutex::new(open_database(db_path)?),
        })
    }

    /// Fails `processing` jobs whose last update is older than `idle_for`.
    /// A live job reports progress at least once per page, so only jobs whose
    /// process died stay quiet that long.
    pub fn fail_stale(&self, idle_for: Duration) -> Result<usize, ImportError> {
        let Some(cutoff) = utc_string_before(idle_for) else {
            return Ok(0);
        };

        let connection = lock(&self.connection)?;
        let count = connection.execute(
            "UPDATE import_jobs SET status = 'failed', error = ?1, updated_at = ?2
             WHERE status = 'processing' AND updated_at < ?3",
            params![INTERRUPTED_JOB_ERROR, now_utc_string(), cutoff],
        )?;
        if count > 0 {
            warn!(jobs = count, idle_secs = idle_for.as_secs(), "marked interrupted import jobs as failed");
        }
        Ok(count)
    }

    fn query_job(
        connection: &Connection,
        filter: &str,
        values: &[&dyn rusqlite::ToSql],
    ) -> Result<Option<ImportJob>, ImportError> {
        let sql = format!(
            "SELECT job_id, owner_id, target_center_id, status, progress_json, result_json,
                    error, started_at, updated_at
             FROM import_jobs WHERE {filter}"
        );

        let row = connection
            .query_row(&sql, values, |row| {
                Ok(StoredJob {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    target_center_id: row.get(2)?,
                    status: row.get(3)?,
                    progress_json: row.get(4)?,
                    result_json: row.get(5)?,
                    error: row.get(6)?,
                    started_at: row.get(7)?,
                    updated_at: row.get(8)?,
                })
            })
            .optional()?;

        row.map(StoredJob::into_job).transpose()
    }

    fn transition(
        &self,
        job_id: &str,
        set: &str,
        values: &[&dyn rusqlite::ToSql],
    ) -> Result<bool, ImportError> {
        let connection = lock(&self.connection)?;
        if Self::query_job(&connection, "job_id = ?1", &[&job_id])?.is_none() {
            return Err(ImportError::NotFound(format!("job {job_id}")));
        }

        let now = now_utc_string();
        let mut bound: Vec<&dyn rusqlite::ToSql> = vec![&job_id];
        bound.extend_from_slice(values);
        bound.push(&now);

        let sql = format!(
            "UPDATE import_jobs SET {set}, updated_at = ?{}
             WHERE job_id = ?1 AND status = 'processing'",
            bound.len()
        );
        let changed = connection
            .execute(&sql, bound.as_slice())
            .with_context(|| format!("failed to update import job {job_id}"))?;
        Ok(changed > 0)
    }
}

struct StoredJob {
    id: String,
    owner_id: String,
    target_center_id: String,
    status: String,
    progress_json: String,
    result_json: Option<String>,
    error: Option<String>,
    started_at: String,
    updated_at: String,
}

impl StoredJob {
    fn into_job(self) -> Result<ImportJob, ImportError> {
        let status = JobStatus::from_db(&self.status).ok_or_else(|| {
            anyhow!("import job {} has unknown status {}", self.id, self.status)
        })?;
        let progress = serde_json::from_str(&self.progress_json)
            .with_context(|| format!("failed to parse progress of import job {}", self.id))?;
        let result = self
            .result_json
            .as_deref()
            .map(serde_json::from_str::<ImportResult>)
            .transpose()
            .with_context(|| format!("failed to parse result of import job {}", self.id))?;

        Ok(ImportJob {
            id: self.id,
            owner_id: self.owner_id,
            target_center_id: self.target_center_id,
            status,
            progress,
            result,
            error: self.error,
            started_at: self.started_at,
            updated_at: self.updated_at,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ImportError> {
    Ok(serde_json::to_string(value).context("failed to serialize import job state")?)
}

impl JobStore for SqliteJobStore {
    fn create_if_idle(&self, owner_id: &str, center_id: &str) -> Result<ImportJob, ImportError> {
        let mut connection = lock(&self.connection)?;
        let tx = connection.transaction()?;

        if let Some(existing) = Self::query_job(
            &tx,
            "owner_id = ?1 AND target_center_id = ?2 AND status = 'processing'",
            &[&owner_id, &center_id],
        )? {
            return Err(ImportError::Conflict {
                existing_job_id: existing.id,
            });
        }

        let job = new_job(owner_id, center_id);
        tx.execute(
            "INSERT INTO import_jobs(
               job_id, owner_id, target_center_id, status, progress_json,
               result_json, error, started_at, updated_at
             )
             VALUES(?1, ?2, ?3, ?4, ?5, NULL, NULL, ?6, ?7)",
            params![
                job.id,
                job.owner_id,
                job.target_center_id,
                job.status.as_str(),
                to_json(&job.progress)?,
                job.started_at,
                job.updated_at
            ],
        )?;
        tx.commit()?;

        Ok(job)
    }

    fn get(&self, job_id: &str) -> Result<Option<ImportJob>, ImportError> {
        let connection = lock(&self.connection)?;
        Self::query_job(&connection, "job_id = ?1", &[&job_id])
    }

    fn update_progress(&self, job_id: &str, progress: &JobProgress) -> Result<bool, ImportError> {
        let progress_json = to_json(progress)?;
        self.transition(job_id, "progress_json = ?2", &[&progress_json])
    }

    fn complete(&self, job_id: &str, result: &ImportResult) -> Result<bool, ImportError> {
        let result_json = to_json(result)?;
        self.transition(
            job_id,
            "status = 'done', result_json = ?2",
            &[&result_json],
        )
    }

    fn fail(&self, job_id: &str, error: &str) -> Result<bool, ImportError> {
        self.transition(job_id, "status = 'failed', error = ?2", &[&error])
    }
}
