//! Log filter setup for the CLI
//!
//! The subscriber is installed before configuration is resolved, so config
//! loading is itself logged. `RUST_LOG` pins the filter; otherwise it starts
//! at `info` and switches to the configured level once that is known.

use crate::error::LogFilterError;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Level used until the config file has been read
pub const DEFAULT_LEVEL: &str = "info";

/// Switches the installed filter to the configured level
pub struct LogFilterHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    pinned_by_env: bool,
}

/// Reloadable filter layer, seeded from `RUST_LOG` when set
pub fn reloadable_filter() -> (reload::Layer<EnvFilter, Registry>, LogFilterHandle) {
    filter_layer(EnvFilter::try_from_default_env().ok())
}

/// Reloadable filter layer; `pinned` (from the environment) is never replaced
pub fn filter_layer(pinned: Option<EnvFilter>) -> (reload::Layer<EnvFilter, Registry>, LogFilterHandle) {
    let pinned_by_env = pinned.is_some();
    let (layer, handle) =
        reload::Layer::new(pinned.unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL)));
    (
        layer,
        LogFilterHandle {
            handle,
            pinned_by_env,
        },
    )
}

impl LogFilterHandle {
    /// Apply the configured level; returns false when `RUST_LOG` pinned the filter
    pub fn apply_config_level(&self, level: &str) -> Result<bool, LogFilterError> {
        if self.pinned_by_env {
            return Ok(false);
        }

        let filter = EnvFilter::try_new(level)
            .map_err(|e| LogFilterError::InvalidLevel(level.to_string(), e.to_string()))?;
        self.handle
            .reload(filter)
            .map_err(|e| LogFilterError::Reload(e.to_string()))?;
        Ok(true)
    }
}
