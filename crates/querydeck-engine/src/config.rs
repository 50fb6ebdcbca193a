//! Engine configuration

use querydeck_core::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Rows per archive chunk file
pub const DEFAULT_ARCHIVE_CHUNK_SIZE: usize = 500;
/// Concurrent chunk writers per archival
pub const DEFAULT_ARCHIVE_PARALLELISM: usize = 10;
/// Per-row wait when reading an archive back
pub const DEFAULT_ARCHIVE_READ_TIMEOUT_MS: u64 = 5_000;
/// Rows buffered between the archive reader task and its consumer
pub const DEFAULT_ARCHIVE_CHANNEL_CAPACITY: usize = 1_000;
/// Poll interval while a range read waits for rows
pub const DEFAULT_ROWS_POLL_INTERVAL_MS: u64 = 50;
/// Give up waiting for rows after five minutes
pub const DEFAULT_ROWS_TIMEOUT_MS: u64 = 5 * 60 * 1_000;

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV: &str = "QUERYDECK_STATE_DIR";

fn default_state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .ok()
        .or_else(|| dirs::data_dir().map(|dir| dir.join("querydeck")))
        .unwrap_or_else(|| PathBuf::from(".querydeck"))
}

fn default_archive_chunk_size() -> usize {
    DEFAULT_ARCHIVE_CHUNK_SIZE
}

fn default_archive_parallelism() -> usize {
    DEFAULT_ARCHIVE_PARALLELISM
}

fn default_archive_read_timeout_ms() -> u64 {
    DEFAULT_ARCHIVE_READ_TIMEOUT_MS
}

fn default_archive_channel_capacity() -> usize {
    DEFAULT_ARCHIVE_CHANNEL_CAPACITY
}

fn default_rows_poll_interval_ms() -> u64 {
    DEFAULT_ROWS_POLL_INTERVAL_MS
}

fn default_rows_timeout_ms() -> u64 {
    DEFAULT_ROWS_TIMEOUT_MS
}

/// Configuration shared by connections, calls, results and archives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root of everything persisted (archives, call logs)
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default = "default_archive_chunk_size")]
    pub archive_chunk_size: usize,

    #[serde(default = "default_archive_parallelism")]
    pub archive_parallelism: usize,

    #[serde(default = "default_archive_read_timeout_ms")]
    pub archive_read_timeout_ms: u64,

    #[serde(default = "default_archive_channel_capacity")]
    pub archive_channel_capacity: usize,

    #[serde(default = "default_rows_poll_interval_ms")]
    pub rows_poll_interval_ms: u64,

    #[serde(default = "default_rows_timeout_ms")]
    pub rows_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            archive_chunk_size: DEFAULT_ARCHIVE_CHUNK_SIZE,
            archive_parallelism: DEFAULT_ARCHIVE_PARALLELISM,
            archive_read_timeout_ms: DEFAULT_ARCHIVE_READ_TIMEOUT_MS,
            archive_channel_capacity: DEFAULT_ARCHIVE_CHANNEL_CAPACITY,
            rows_poll_interval_ms: DEFAULT_ROWS_POLL_INTERVAL_MS,
            rows_timeout_ms: DEFAULT_ROWS_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Defaults rooted at an explicit state directory
    pub fn with_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            ..Default::default()
        }
    }

    /// Defaults with `QUERYDECK_*` environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_number("QUERYDECK_ARCHIVE_CHUNK_SIZE")? {
            config.archive_chunk_size = v as usize;
        }
        if let Some(v) = env_number("QUERYDECK_ARCHIVE_PARALLELISM")? {
            config.archive_parallelism = v as usize;
        }
        if let Some(v) = env_number("QUERYDECK_ARCHIVE_READ_TIMEOUT_MS")? {
            config.archive_read_timeout_ms = v;
        }
        if let Some(v) = env_number("QUERYDECK_ROWS_TIMEOUT_MS")? {
            config.rows_timeout_ms = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("archive_chunk_size", self.archive_chunk_size as u64),
            ("archive_parallelism", self.archive_parallelism as u64),
            ("archive_read_timeout_ms", self.archive_read_timeout_ms),
            ("archive_channel_capacity", self.archive_channel_capacity as u64),
            ("rows_poll_interval_ms", self.rows_poll_interval_ms),
            ("rows_timeout_ms", self.rows_timeout_ms),
        ];

        for (name, value) in checks {
            if value == 0 {
                return Err(DataError::invalid_configuration(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Directory holding one archive directory per call
    pub fn archive_dir(&self) -> PathBuf {
        self.state_dir.join("archive")
    }

    /// Directory holding one call log file per connection
    pub fn call_log_dir(&self) -> PathBuf {
        self.state_dir.join("calls")
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn archive_read_timeout(&self) -> Duration {
        Duration::from_millis(self.archive_read_timeout_ms)
    }

    pub fn rows_poll_interval(&self) -> Duration {
        Duration::from_millis(self.rows_poll_interval_ms)
    }

    pub fn rows_timeout(&self) -> Duration {
        Duration::from_millis(self.rows_timeout_ms)
    }
}

fn env_number(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<u64>().map(Some).map_err(|e| {
            DataError::invalid_configuration(format!("{} is not a number: {}", key, e))
        }),
        Err(_) => Ok(None),
    }
}
