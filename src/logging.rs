//! Tracing configuration and log routing.
//!
//! Logs go to stderr through a compact formatter and, unless disabled, to a file. Stdout is left
//! to command output.
//! `DOCFLOW_LOG_FILE` selects the file (appended to); `DOCFLOW_LOG_FILE=off` disables file
//! logging; when unset, `logs/docflow.log` is used. File output goes through a non-blocking
//! writer so worker tasks never wait on disk.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::TryInitError};

const LOG_FILE_VAR: &str = "DOCFLOW_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "docflow.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where file logs should go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FileTarget {
    Disabled,
    Default,
    Path(String),
}

impl FileTarget {
    fn from_value(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            None | Some("") => Self::Default,
            Some(v) if v.eq_ignore_ascii_case("off") || v.eq_ignore_ascii_case("none") => {
                Self::Disabled
            }
            Some(v) => Self::Path(v.to_string()),
        }
    }
}

/// Configure tracing subscribers for stderr and optional file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact stderr layer and, when available, a file layer.
/// - Fails if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    let target = FileTarget::from_value(std::env::var(LOG_FILE_VAR).ok());
    if let Some(writer) = configure_file_writer(&target) {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    }
}

/// Build a non-blocking writer for file logging.
///
/// Returns `None` when disabled, or when the target cannot be opened.
fn configure_file_writer(target: &FileTarget) -> Option<NonBlocking> {
    let (non_blocking, guard) = match target {
        FileTarget::Disabled => return None,
        FileTarget::Path(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| eprintln!("Failed to open log file {path}: {err}"))
                .ok()?;
            tracing_appender::non_blocking(file)
        }
        FileTarget::Default => {
            if let Err(err) = std::fs::create_dir_all(DEFAULT_LOG_DIR) {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            let appender = tracing_appender::rolling::never(DEFAULT_LOG_DIR, DEFAULT_LOG_FILE);
            tracing_appender::non_blocking(appender)
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
