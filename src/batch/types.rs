//! Job records, configuration, and error definitions for batch coordination.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Key under which cancellation is recorded in a job's `errors` map.
pub const CANCELLED_ERROR_KEY: &str = "_cancelled";
/// Key under which a pool-level failure is recorded in a job's `errors` map.
pub const FATAL_ERROR_KEY: &str = "_fatal";

/// Default number of concurrent workers per job.
pub const DEFAULT_MAX_WORKERS: usize = 4;
/// Default per-file processing deadline.
pub const DEFAULT_TIMEOUT_PER_FILE: Duration = Duration::from_secs(300);
/// Default interval between status polls while waiting for a job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Default base delay between retry attempts.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Lifecycle state of a batch job.
///
/// `Completed` and `Failed` are terminal. Cancellation also ends in `Failed`, distinguished only
/// by the [`CANCELLED_ERROR_KEY`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted, workers not started yet.
    Pending,
    /// Workers are consuming the file list.
    Processing,
    /// Every file was attempted and at least one succeeded.
    Completed,
    /// Cancelled, failed fast, hit a fatal error, or no file succeeded.
    Failed,
}

impl JobStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Tuning knobs for the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum files processed concurrently for one job.
    pub max_workers: usize,
    /// Abort remaining work and fail the job on the first per-file failure.
    pub fail_fast: bool,
    /// Deadline applied to each processing attempt.
    pub timeout_per_file: Duration,
    /// Extra attempts made after a failed one.
    pub max_retries: u32,
    /// Base delay before a retry; attempt `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// Interval between polls in [`crate::batch::BatchCoordinator::get_result`].
    pub poll_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            fail_fast: false,
            timeout_per_file: DEFAULT_TIMEOUT_PER_FILE,
            max_retries: 0,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Successful result for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Identifier of the input file.
    pub file: String,
    /// Text produced by the document processor.
    pub content: String,
}

/// Point-in-time copy of a job record.
#[derive(Debug, Clone, Serialize)]
pub struct BatchJob {
    /// Identifier assigned at submission.
    pub job_id: Uuid,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Number of submitted files.
    pub total_files: usize,
    /// Files processed successfully.
    pub processed_files: usize,
    /// Files whose processing failed or timed out.
    pub failed_files: usize,
    /// Outcomes aligned with the submitted order; `None` until that file succeeds.
    pub results: Vec<Option<FileOutcome>>,
    /// Error messages keyed by file identifier, plus reserved job-level keys.
    ///
    /// A repeated identifier is keyed as `<identifier>#<input index>`.
    pub errors: BTreeMap<String, String>,
    /// Submission time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Time the job reached a terminal state.
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl BatchJob {
    pub(crate) fn new(job_id: Uuid, total_files: usize) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            total_files,
            processed_files: 0,
            failed_files: 0,
            results: vec![None; total_files],
            errors: BTreeMap::new(),
            created_at: OffsetDateTime::now_utc(),
            completed_at: None,
        }
    }

    /// Whether the job was ended by an explicit cancel request.
    pub fn is_cancelled(&self) -> bool {
        self.errors.contains_key(CANCELLED_ERROR_KEY)
    }

    pub(crate) fn finish(&mut self, status: JobStatus) {
        self.status = status;
        self.completed_at = Some(OffsetDateTime::now_utc());
    }
}

/// Why a single file failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FileError {
    /// The processor did not answer within the per-file deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The processor returned an error.
    #[error("{0}")]
    Processing(String),
}

/// Errors returned by the batch coordinator.
#[derive(Debug, Error)]
pub enum BatchError {
    /// No job with this identifier is tracked.
    #[error("Job not found: {0}")]
    NotFound(Uuid),
    /// The job was cancelled before it finished.
    #[error("Job {job_id} was cancelled")]
    Cancelled {
        /// Identifier of the cancelled job.
        job_id: Uuid,
        /// Errors collected up to cancellation.
        errors: BTreeMap<String, String>,
    },
    /// The job ended in `Failed`.
    #[error("Job {job_id} failed: {}", summarize(.errors))]
    JobFailed {
        /// Identifier of the failed job.
        job_id: Uuid,
        /// Every per-file and job-level error collected.
        errors: BTreeMap<String, String>,
    },
}

impl BatchError {
    /// Accumulated errors carried by terminal-state failures.
    pub fn errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::NotFound(_) => None,
            Self::Cancelled { errors, .. } | Self::JobFailed { errors, .. } => Some(errors),
        }
    }
}

fn summarize(errors: &BTreeMap<String, String>) -> String {
    if errors.is_empty() {
        return "no files succeeded".to_string();
    }
    errors
        .iter()
        .map(|(file, message)| format!("{file}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
