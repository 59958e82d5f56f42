//! Daemon configuration.
//!
//! Loaded from `~/.config/gitpulse/config.toml` (or a `--config` override).
//! Every field except the remote URL has a default; the remote URL must be
//! configured explicitly.
//!
//! ```toml
//! remote_url = "https://github.com/example/heartbeat.git"
//! repo_path = "/home/me/gitpulse/repo"
//! marker_file = "README.md"
//! commit_time = "22:00"
//! poll_interval_secs = 60
//! ```

use chrono::NaiveTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default wall-clock time for the daily publish.
pub const DEFAULT_COMMIT_TIME: &str = "22:00";

/// Default polling interval for the scheduler loop.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default marker file mutated on each publish.
pub const DEFAULT_MARKER_FILE: &str = "README.md";

/// Errors returned when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("remote_url is not configured (set it in {0})")]
    MissingRemoteUrl(String),
    #[error("invalid commit_time '{0}' (expected HH:MM)")]
    InvalidCommitTime(String),
    #[error("poll_interval_secs must be greater than zero")]
    ZeroPollInterval,
    #[error("could not determine the home directory")]
    NoHomeDir,
}

/// Daemon configuration, deserialized from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Local working copy path.
    pub repo_path: PathBuf,
    /// URL of the remote repository. Required.
    pub remote_url: String,
    /// File inside the working copy that receives the timestamp line.
    pub marker_file: String,
    /// Wall-clock time of the daily publish, `HH:MM`.
    pub commit_time: String,
    /// Scheduler polling interval in seconds.
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            remote_url: String::new(),
            marker_file: DEFAULT_MARKER_FILE.to_string(),
            commit_time: DEFAULT_COMMIT_TIME.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

/// Default working copy location: `<home>/gitpulse/repo`.
fn default_repo_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gitpulse")
        .join("repo")
}

/// Path to the default config file: `<config dir>/gitpulse/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|d| d.join("gitpulse").join("config.toml"))
        .ok_or(ConfigError::NoHomeDir)
}

impl Config {
    /// Load from `override_path` if given, otherwise from the default
    /// location. Validates after parsing.
    pub fn load(override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match override_path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        Self::load_from(&path)
    }

    /// Load and validate from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, source: &Path) -> Result<(), ConfigError> {
        if self.remote_url.is_empty() {
            return Err(ConfigError::MissingRemoteUrl(source.display().to_string()));
        }
        self.commit_time()?;
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Parse `commit_time` into a time of day.
    pub fn commit_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.commit_time, "%H:%M")
            .map_err(|_| ConfigError::InvalidCommitTime(self.commit_time.clone()))
    }
}
