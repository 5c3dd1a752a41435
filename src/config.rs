//! Store and logging configuration.
//!
//! [`StoreConfig`] is always available for programmatic use. Loading a
//! [`Config`] from a TOML file requires the `config` feature.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::store::DEFAULT_PAGE_SIZE;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite `journal_mode` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl JournalMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Wal => "wal",
            JournalMode::Delete => "delete",
        }
    }
}

/// SQLite `synchronous` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    Full,
    Normal,
}

impl SyncMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            SyncMode::Full => "full",
            SyncMode::Normal => "normal",
        }
    }
}

/// How to open the backing database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: JournalMode,
    #[serde(default)]
    pub synchronous: SyncMode,
    /// Rows fetched per page when iterating a table.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl StoreConfig {
    /// Defaults for everything but the path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            synchronous: SyncMode::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Log output format for the CLI subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info` or `docstore_sqlite=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub storage: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(feature = "config")]
impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

impl Config {
    /// Configuration for a database at `path` with default settings.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self {
            storage: StoreConfig::new(path.as_ref()),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration loading error.
#[cfg(feature = "config")]
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
