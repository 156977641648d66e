use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::{ImportArgs, JobStoreKind};
use crate::jobs::{JobStore, JobTracker, MemoryJobStore, OcrPipeline, SqliteJobStore};
use crate::model::JobStatus;
use crate::ocr::TesseractRecognizer;
use crate::store::{find_owned_center, open_database, persist_records};
use crate::util::write_json_pretty;

pub fn run(args: ImportArgs) -> Result<()> {
    let db_path = args.database.resolved_db_path();
    let mut connection = open_database(&db_path)?;
    let center = find_owned_center(&connection, &args.owner, &args.center)?;

    let document = fs::read(&args.pdf)
        .with_context(|| format!("failed to read {}", args.pdf.display()))?;

    let ocr_config = args.ocr_config();
    let store: Arc<dyn JobStore> = match args.job_store {
        JobStoreKind::Memory => Arc::new(MemoryJobStore::new()),
        JobStoreKind::Sqlite => {
            let store = SqliteJobStore::open(&db_path)?;
            store.fail_stale(ocr_config.stale_job_after())?;
            Arc::new(store)
        }
    };

    let recognizer = TesseractRecognizer::new(&ocr_config);
    let pipeline = OcrPipeline::new(args.extraction.config(), ocr_config, recognizer)?;
    let tracker = JobTracker::new(store, Arc::new(pipeline));

    let handle = tracker.submit(&args.owner, &center.id, document)?;
    let job_id = handle.job_id.clone();
    info!(
        job_id = %job_id,
        center = %center.name,
        pdf = %args.pdf.display(),
        "import submitted"
    );

    for progress in handle.progress.iter() {
        info!(
            job_id = %job_id,
            stage = %progress.stage,
            current = progress.current,
            total = progress.total,
            page = %progress.page.as_deref().unwrap_or("-"),
            "import progress"
        );
    }
    handle.wait();

    let view = tracker.status(&job_id, &args.owner)?;
    let output_path = args.output.clone().unwrap_or_else(|| {
        args.database
            .cache_root
            .join("imports")
            .join(format!("import_{job_id}.json"))
    });
    write_json_pretty(&output_path, &view)?;
    info!(
        path = %output_path.display(),
        status = view.status.as_str(),
        "wrote import result"
    );

    if view.status == JobStatus::Failed {
        bail!(
            "import job {job_id} failed: {}",
            view.error.as_deref().unwrap_or("unknown error")
        );
    }

    if let Some(result) = view.data.as_ref().filter(|_| args.save) {
        let summary = persist_records(&mut connection, &args.owner, &center.id, &result.records)?;
        info!(
            inserted = summary.inserted,
            total = summary.total,
            rejected = summary.errors.as_ref().map_or(0, Vec::len),
            "saved imported records"
        );
    }

    Ok(())
}
