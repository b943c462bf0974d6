use crate::{
    batch::BatchConfig,
    chunking::{ChunkingConfig, ChunkingError},
    embedding::DEFAULT_EMBEDDING_DIMENSION,
};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value found.
        value: String,
    },
    /// Chunking options were individually valid but inconsistent.
    #[error("Invalid chunking configuration: {0}")]
    Chunking(#[from] ChunkingError),
    /// Worker pool would have no workers.
    #[error("BATCH_MAX_WORKERS must be at least 1")]
    NoWorkers,
}

/// Runtime configuration for chunking and batch processing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Options handed to the chunker.
    pub chunking: ChunkingConfig,
    /// Options handed to the batch coordinator.
    pub batch: BatchConfig,
    /// Dimensionality of vectors produced by the embedding backend.
    pub embedding_dimension: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset or blank variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let chunk_defaults = ChunkingConfig::default();
        let batch_defaults = BatchConfig::default();

        let chunking = ChunkingConfig {
            chunk_size: vars.parse("CHUNK_SIZE")?.unwrap_or(chunk_defaults.chunk_size),
            chunk_overlap: vars
                .parse("CHUNK_OVERLAP")?
                .unwrap_or(chunk_defaults.chunk_overlap),
            respect_headings: vars
                .flag("CHUNK_RESPECT_HEADINGS")?
                .unwrap_or(chunk_defaults.respect_headings),
            add_chunk_markers: vars
                .flag("CHUNK_ADD_MARKERS")?
                .unwrap_or(chunk_defaults.add_chunk_markers),
        };
        chunking.validate()?;

        let batch = BatchConfig {
            max_workers: vars
                .parse("BATCH_MAX_WORKERS")?
                .unwrap_or(batch_defaults.max_workers),
            fail_fast: vars
                .flag("BATCH_FAIL_FAST")?
                .unwrap_or(batch_defaults.fail_fast),
            timeout_per_file: vars
                .parse("BATCH_TIMEOUT_PER_FILE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(batch_defaults.timeout_per_file),
            max_retries: vars
                .parse("BATCH_MAX_RETRIES")?
                .unwrap_or(batch_defaults.max_retries),
            retry_backoff: vars
                .parse("BATCH_RETRY_BACKOFF_MS")?
                .map(Duration::from_millis)
                .unwrap_or(batch_defaults.retry_backoff),
            poll_interval: vars
                .parse("BATCH_POLL_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(batch_defaults.poll_interval),
        };
        if batch.max_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }

        Ok(Self {
            chunking,
            batch,
            embedding_dimension: vars
                .parse("EMBEDDING_DIMENSION")?
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSION),
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| {
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                })
            })
            .transpose()
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.get(key)
            .map(|value| match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                }),
            })
            .transpose()
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment (and `.env`) and install it in the global cache.
///
/// Later calls return the configuration installed by the first successful call.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        chunk_size = config.chunking.chunk_size,
        chunk_overlap = config.chunking.chunk_overlap,
        max_workers = config.batch.max_workers,
        fail_fast = config.batch.fail_fast,
        timeout_per_file = ?config.batch.timeout_per_file,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
