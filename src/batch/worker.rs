//! Worker pool execution for a single batch job.

use super::types::{BatchConfig, BatchJob, FATAL_ERROR_KEY, FileError, FileOutcome, JobStatus};
use crate::{
    metrics::BatchMetrics,
    processor::{DocumentInput, DocumentProcessor},
};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use tokio::task::JoinSet;
use uuid::Uuid;

/// Shared, lock-guarded job record.
pub(crate) type JobHandle = Arc<Mutex<BatchJob>>;

/// Lock a job record.
///
/// Every critical section leaves the record consistent, so a poisoned lock is still usable.
pub(crate) fn lock(job: &Mutex<BatchJob>) -> MutexGuard<'_, BatchJob> {
    job.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether the job has reached a terminal state.
pub(crate) fn is_finished(job: &Mutex<BatchJob>) -> bool {
    lock(job).status.is_terminal()
}

/// Move a record into a terminal state and count it.
pub(crate) fn conclude(record: &mut BatchJob, status: JobStatus, metrics: &BatchMetrics) {
    record.finish(status);
    metrics.record_job_finished(status);
    tracing::info!(
        job_id = %record.job_id,
        status = ?status,
        processed = record.processed_files,
        failed = record.failed_files,
        total = record.total_files,
        "Batch job finished"
    );
}

/// Collaborators shared by every worker of the coordinator.
pub(crate) struct WorkerContext {
    pub(crate) processor: Arc<dyn DocumentProcessor>,
    pub(crate) config: BatchConfig,
    pub(crate) metrics: Arc<BatchMetrics>,
}

/// Drive one job from `Pending` to a terminal state.
pub(crate) async fn run_job(ctx: Arc<WorkerContext>, job: JobHandle, files: Vec<DocumentInput>) {
    let job_id = {
        let mut record = lock(&job);
        if record.status != JobStatus::Pending {
            tracing::debug!(job_id = %record.job_id, "Job left pending before workers started");
            return;
        }
        record.status = JobStatus::Processing;
        record.job_id
    };

    let files = Arc::new(files);
    let cursor = Arc::new(AtomicUsize::new(0));
    let workers = ctx.config.max_workers.max(1).min(files.len().max(1));
    tracing::debug!(%job_id, workers, files = files.len(), "Starting worker pool");

    let mut pool = JoinSet::new();
    for _ in 0..workers {
        pool.spawn(worker_loop(
            ctx.clone(),
            job.clone(),
            files.clone(),
            cursor.clone(),
        ));
    }

    while let Some(joined) = pool.join_next().await {
        let Err(error) = joined else { continue };
        if !error.is_panic() {
            continue;
        }
        tracing::error!(%job_id, error = %error, "Worker panicked; aborting job");
        {
            let mut record = lock(&job);
            if !record.status.is_terminal() {
                record
                    .errors
                    .insert(FATAL_ERROR_KEY.to_string(), format!("worker panicked: {error}"));
                conclude(&mut record, JobStatus::Failed, &ctx.metrics);
            }
        }
        pool.abort_all();
    }

    settle(&ctx, &job, job_id);
}

/// Resolve a job whose workers all returned without reaching a terminal state.
fn settle(ctx: &WorkerContext, job: &Mutex<BatchJob>, job_id: Uuid) {
    let mut record = lock(job);
    if record.status.is_terminal() {
        return;
    }
    let status = if record.total_files > 0 && record.processed_files == 0 {
        JobStatus::Failed
    } else {
        JobStatus::Completed
    };
    tracing::debug!(%job_id, status = ?status, "All files attempted");
    conclude(&mut record, status, &ctx.metrics);
}

async fn worker_loop(
    ctx: Arc<WorkerContext>,
    job: JobHandle,
    files: Arc<Vec<DocumentInput>>,
    cursor: Arc<AtomicUsize>,
) {
    loop {
        if is_finished(&job) {
            break;
        }
        let index = cursor.fetch_add(1, Ordering::SeqCst);
        let Some(input) = files.get(index) else {
            break;
        };
        let file = input.identifier();
        let outcome = process_with_retries(&ctx, &job, input, &file).await;
        record_outcome(&ctx, &job, index, file, outcome);
    }
}

async fn process_with_retries(
    ctx: &WorkerContext,
    job: &Mutex<BatchJob>,
    input: &DocumentInput,
    file: &str,
) -> Result<String, FileError> {
    let deadline = ctx.config.timeout_per_file;
    let mut attempt: u32 = 0;

    loop {
        let error = match tokio::time::timeout(deadline, ctx.processor.process(input)).await {
            Ok(Ok(text)) => return Ok(text),
            Ok(Err(error)) => FileError::Processing(error.to_string()),
            Err(_) => FileError::Timeout(deadline),
        };

        if attempt >= ctx.config.max_retries || is_finished(job) {
            return Err(error);
        }
        attempt += 1;
        let delay = ctx.config.retry_backoff * attempt;
        tracing::warn!(file = %file, attempt, ?delay, error = %error, "Retrying file");
        tokio::time::sleep(delay).await;
    }
}

fn record_outcome(
    ctx: &WorkerContext,
    job: &Mutex<BatchJob>,
    index: usize,
    file: String,
    outcome: Result<String, FileError>,
) {
    let mut record = lock(job);
    if record.status.is_terminal() {
        tracing::debug!(job_id = %record.job_id, file = %file, "Discarding result for finished job");
        return;
    }

    match outcome {
        Ok(content) => {
            tracing::debug!(job_id = %record.job_id, file = %file, index, "File processed");
            record.results[index] = Some(FileOutcome { file, content });
            record.processed_files += 1;
            ctx.metrics.record_file(true);
        }
        Err(error) => {
            tracing::warn!(job_id = %record.job_id, file = %file, error = %error, "File failed");
            let key = error_key(&record, file, index);
            record.errors.insert(key, error.to_string());
            record.failed_files += 1;
            ctx.metrics.record_file(false);
            if ctx.config.fail_fast {
                conclude(&mut record, JobStatus::Failed, &ctx.metrics);
            }
        }
    }
}

/// Key for a per-file error; repeated names get `#<input index>` appended.
fn error_key(record: &BatchJob, file: String, index: usize) -> String {
    if record.errors.contains_key(&file) {
        format!("{file}#{index}")
    } else {
        file
    }
}
