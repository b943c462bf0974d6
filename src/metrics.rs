use crate::batch::JobStatus;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing batch activity.
#[derive(Default)]
pub struct BatchMetrics {
    jobs_submitted: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
    files_processed: AtomicU64,
    files_failed: AtomicU64,
}

impl BatchMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly submitted job.
    pub fn record_job_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a job reaching a terminal state.
    pub fn record_job_finished(&self, status: JobStatus) {
        match status {
            JobStatus::Completed => self.jobs_completed.fetch_add(1, Ordering::Relaxed),
            JobStatus::Failed => self.jobs_failed.fetch_add(1, Ordering::Relaxed),
            JobStatus::Pending | JobStatus::Processing => return,
        };
    }

    /// Record the outcome of one file.
    pub fn record_file(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.files_processed
        } else {
            &self.files_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of batch counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Jobs accepted since startup.
    pub jobs_submitted: u64,
    /// Jobs that ended in `Completed`.
    pub jobs_completed: u64,
    /// Jobs that ended in `Failed`, including cancellations.
    pub jobs_failed: u64,
    /// Files processed successfully.
    pub files_processed: u64,
    /// Files that failed or timed out.
    pub files_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_jobs_and_files() {
        let metrics = BatchMetrics::new();
        metrics.record_job_submitted();
        metrics.record_job_submitted();
        metrics.record_file(true);
        metrics.record_file(true);
        metrics.record_file(false);
        metrics.record_job_finished(JobStatus::Completed);
        metrics.record_job_finished(JobStatus::Failed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_submitted, 2);
        assert_eq!(snapshot.jobs_completed, 1);
        assert_eq!(snapshot.jobs_failed, 1);
        assert_eq!(snapshot.files_processed, 2);
        assert_eq!(snapshot.files_failed, 1);
    }

    #[test]
    fn non_terminal_status_is_ignored() {
        let metrics = BatchMetrics::new();
        metrics.record_job_finished(JobStatus::Processing);
        assert_eq!(metrics.snapshot(), MetricsSnapshot {
            jobs_submitted: 0,
            jobs_completed: 0,
            jobs_failed: 0,
            files_processed: 0,
            files_failed: 0,
        });
    }
}
