//! Concurrent processing of document batches.
//!
//! A [`BatchCoordinator`] accepts a list of [`crate::processor::DocumentInput`]s, returns a job
//! id at once, and processes the files on a bounded Tokio worker pool. Callers observe progress
//! through [`BatchJob`] snapshots and collect ordered results with
//! [`BatchCoordinator::get_result`].
//!
//! State machine: `Pending -> Processing -> Completed | Failed`, plus `Pending | Processing ->
//! Failed` on cancel. Terminal records are never mutated again; late worker results are dropped.

mod coordinator;
pub mod types;
mod worker;

pub use coordinator::BatchCoordinator;
pub use types::{
    BatchConfig, BatchError, BatchJob, CANCELLED_ERROR_KEY, DEFAULT_MAX_WORKERS,
    DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_BACKOFF, DEFAULT_TIMEOUT_PER_FILE, FATAL_ERROR_KEY,
    FileError, FileOutcome, JobStatus,
};
