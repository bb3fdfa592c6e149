//! File-based configuration for the fetch client
//!
//! Settings live in a JSON file in the XDG config directory
//! (`~/.config/fpfetch/config.json` on Linux). Every field is optional; a missing
//! file means all defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::{RetryPolicy, StatusRetry};

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON for `FetchConfig`
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Client settings, all with defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Shared deadline per logical request, in milliseconds
    pub timeout_ms: u64,
    /// Freshness window for cached reads, in seconds
    pub cache_ttl_secs: u64,
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Whether 4xx responses are retried like 5xx ones
    pub retry_client_errors: bool,
    /// Prefix for request paths that are not absolute URLs
    pub base_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            cache_ttl_secs: 300,    // 5 minutes
            max_attempts: 4,
            base_delay_ms: 1_000,
            retry_client_errors: true,
            base_url: None,
        }
    }
}

impl FetchConfig {
    /// Default config file location, `None` when no home directory is known
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "fpfetch")?;
        Some(project_dirs.config_dir().join("config.json"))
    }

    /// Loads the config at `path`, falling back to defaults if the file is absent
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from `path` if given, otherwise from the default location
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Retry policy described by this config
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            status_retry: if self.retry_client_errors {
                StatusRetry::All
            } else {
                StatusRetry::ServerErrorsOnly
            },
        }
    }
}
