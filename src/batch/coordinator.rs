//! Batch coordinator owning the job table and the public job API.

use super::{
    types::{BatchConfig, BatchError, BatchJob, CANCELLED_ERROR_KEY, FileOutcome, JobStatus},
    worker::{JobHandle, WorkerContext, conclude, lock, run_job},
};
use crate::{
    metrics::{BatchMetrics, MetricsSnapshot},
    processor::{DocumentInput, DocumentProcessor},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use uuid::Uuid;

/// Schedules document batches across a bounded worker pool and tracks their lifecycle.
///
/// Each submitted job gets its own pool of at most `max_workers` tasks. Results land in the slot
/// matching the input position, never in completion order. Records stay in memory until
/// [`BatchCoordinator::clear`] or [`BatchCoordinator::clear_finished`] removes them.
pub struct BatchCoordinator {
    context: Arc<WorkerContext>,
    jobs: RwLock<HashMap<Uuid, JobHandle>>,
}

impl BatchCoordinator {
    /// Build a coordinator around a document processor.
    pub fn new(processor: Arc<dyn DocumentProcessor>, config: BatchConfig) -> Self {
        tracing::debug!(
            max_workers = config.max_workers,
            fail_fast = config.fail_fast,
            timeout_per_file = ?config.timeout_per_file,
            max_retries = config.max_retries,
            "Initializing batch coordinator"
        );
        Self {
            context: Arc::new(WorkerContext {
                processor,
                config,
                metrics: Arc::new(BatchMetrics::new()),
            }),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Accept a batch and return its job id immediately; processing continues in the background.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn submit(&self, files: Vec<DocumentInput>) -> Uuid {
        let job_id = Uuid::new_v4();
        let job: JobHandle = Arc::new(Mutex::new(BatchJob::new(job_id, files.len())));
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id, job.clone());
        self.context.metrics.record_job_submitted();
        tracing::info!(%job_id, files = files.len(), "Batch job submitted");

        tokio::spawn(run_job(self.context.clone(), job, files));
        job_id
    }

    /// Consistent point-in-time copy of a job.
    pub fn get_status(&self, job_id: Uuid) -> Result<BatchJob, BatchError> {
        let job = self.handle(job_id)?;
        let snapshot = lock(&job).clone();
        Ok(snapshot)
    }

    /// Ordered per-file outcomes of a job.
    ///
    /// Without `wait`, returns whatever is present now. With `wait`, polls every
    /// `poll_interval` until the job is terminal, then returns the full results on `Completed`
    /// or an error carrying the collected errors on `Failed`.
    pub async fn get_result(
        &self,
        job_id: Uuid,
        wait: bool,
    ) -> Result<Vec<Option<FileOutcome>>, BatchError> {
        loop {
            let snapshot = self.get_status(job_id)?;
            if !wait {
                return Ok(snapshot.results);
            }
            match snapshot.status {
                JobStatus::Completed => return Ok(snapshot.results),
                JobStatus::Failed if snapshot.is_cancelled() => {
                    return Err(BatchError::Cancelled {
                        job_id,
                        errors: snapshot.errors,
                    });
                }
                JobStatus::Failed => {
                    return Err(BatchError::JobFailed {
                        job_id,
                        errors: snapshot.errors,
                    });
                }
                JobStatus::Pending | JobStatus::Processing => {
                    tokio::time::sleep(self.context.config.poll_interval).await;
                }
            }
        }
    }

    /// Submit a batch and wait for its results.
    pub async fn process_files(
        &self,
        files: Vec<DocumentInput>,
    ) -> Result<Vec<Option<FileOutcome>>, BatchError> {
        let job_id = self.submit(files);
        self.get_result(job_id, true).await
    }

    /// Cancel a pending or running job.
    ///
    /// Returns `false` for unknown or already finished jobs. In-flight files are not interrupted;
    /// their results are discarded when they arrive.
    pub fn cancel(&self, job_id: Uuid) -> bool {
        let Ok(job) = self.handle(job_id) else {
            return false;
        };
        let mut record = lock(&job);
        if record.status.is_terminal() {
            return false;
        }
        record.errors.insert(
            CANCELLED_ERROR_KEY.to_string(),
            "job cancelled by request".to_string(),
        );
        conclude(&mut record, JobStatus::Failed, &self.context.metrics);
        true
    }

    /// Remove a finished job from the table.
    ///
    /// Returns `false` when the job is unknown or still running.
    pub fn clear(&self, job_id: Uuid) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let finished = jobs
            .get(&job_id)
            .is_some_and(|job| lock(job).status.is_terminal());
        if finished {
            jobs.remove(&job_id);
            tracing::debug!(%job_id, "Cleared batch job");
        }
        finished
    }

    /// Remove every finished job, returning how many were dropped.
    pub fn clear_finished(&self) -> usize {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let before = jobs.len();
        jobs.retain(|_, job| !lock(job).status.is_terminal());
        let removed = before - jobs.len();
        tracing::debug!(removed, "Cleared finished batch jobs");
        removed
    }

    /// Snapshots of every tracked job, oldest first.
    pub fn list_jobs(&self) -> Vec<BatchJob> {
        let handles: Vec<JobHandle> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut snapshots: Vec<BatchJob> = handles.iter().map(|job| lock(job).clone()).collect();
        snapshots.sort_by_key(|job| job.created_at);
        snapshots
    }

    /// Return the current batch metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.context.metrics.snapshot()
    }

    fn handle(&self, job_id: Uuid) -> Result<JobHandle, BatchError> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_id)
            .cloned()
            .ok_or(BatchError::NotFound(job_id))
    }
}
