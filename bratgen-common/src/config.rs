//! Client configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is normal and yields defaults. A config file that
//! exists but cannot be read or parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "bratgen";

/// Environment variable overriding the render server URL
pub const ENV_SERVER_URL: &str = "BRATGEN_SERVER_URL";

/// Environment variable overriding the config file location
pub const ENV_CONFIG_PATH: &str = "BRATGEN_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the render server
    pub server_url: String,

    /// Per-request HTTP timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Status polling policy
    pub poll: PollPolicy,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 30_000,
            poll: PollPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse configuration from TOML text; absent keys take defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    /// Resolve configuration from all sources.
    ///
    /// `cli_config` and `cli_server_url` are the command-line values; the
    /// environment is consulted for whichever of them is absent.
    pub fn resolve(cli_config: Option<&Path>, cli_server_url: Option<&str>) -> Result<Self> {
        let config_path = match cli_config {
            Some(path) => Some(path.to_path_buf()),
            None => match std::env::var(ENV_CONFIG_PATH) {
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => default_config_file().filter(|path| path.exists()),
            },
        };

        let mut config = match config_path {
            Some(path) => {
                let config = Self::from_file(&path)?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Some(url) = cli_server_url {
            config.server_url = url.to_string();
        } else if let Ok(url) = std::env::var(ENV_SERVER_URL) {
            config.server_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the client unusable
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(Error::Config("server_url must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request_timeout_ms must be positive".to_string()));
        }
        self.poll.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// How the client polls job status
///
/// Defaults poll every 2 seconds forever, ignoring transient failures.
/// `max_consecutive_failures` bounds how many failed polls in a row are
/// tolerated; `backoff_multiplier` stretches the interval after each failed
/// poll (capped at `max_interval_ms`) and resets on the next success.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    pub interval_ms: u64,
    pub max_consecutive_failures: Option<u32>,
    pub backoff_multiplier: f64,
    pub max_interval_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            max_consecutive_failures: None,
            backoff_multiplier: 1.0,
            max_interval_ms: 30_000,
        }
    }
}

impl PollPolicy {
    /// Fixed-interval policy with no failure ceiling
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Delay before the next poll after `consecutive_failures` failed polls
    pub fn delay_after_failures(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 || self.backoff_multiplier <= 1.0 {
            return self.interval();
        }

        let factor = self.backoff_multiplier.powi(consecutive_failures.min(64) as i32);
        let stretched = (self.interval_ms as f64 * factor).min(self.max_interval_ms as f64);
        Duration::from_millis(stretched.max(self.interval_ms as f64) as u64)
    }

    /// True once `consecutive_failures` reaches the configured ceiling
    pub fn gives_up_after(&self, consecutive_failures: u32) -> bool {
        self.max_consecutive_failures
            .map_or(false, |max| consecutive_failures >= max)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::Config("poll.interval_ms must be positive".to_string()));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::Config(
                "poll.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.max_consecutive_failures == Some(0) {
            return Err(Error::Config(
                "poll.max_consecutive_failures must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Platform config directory for bratgen (`~/.config/bratgen` on Linux)
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Default config file path, if the platform has a config directory
pub fn default_config_file() -> Option<PathBuf> {
    config_dir().ok().map(|d| d.join("config.toml"))
}
