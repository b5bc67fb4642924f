//! Render style options and the local preferences cache
//!
//! The cache is a JSON object stored under a fixed file name. On load it is
//! shallow-merged over the defaults, so a cache written by an older client
//! with fewer keys still applies. A missing or corrupt cache is ignored.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fixed name of the preferences cache file
pub const PREFERENCES_FILE_NAME: &str = "brat_settings.json";

/// Lo-fi intensity bounds accepted by the renderer
pub const LOFI_MIN: u32 = 1;
pub const LOFI_MAX: u32 = 20;

/// Style configuration sent with a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOptions {
    /// Lo-fi intensity level
    pub lofi: u32,
    /// Maximum font size in pixels
    pub fontsize: u32,
    /// Background color (`#RRGGBB`)
    pub bgcolor: String,
    /// Text color; the renderer picks its own default when absent
    #[serde(
        rename = "textColor",
        alias = "textcolor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub text_color: Option<String>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            lofi: 5,
            fontsize: 400,
            bgcolor: "#FFFFFF".to_string(),
            text_color: Some("#000000".to_string()),
        }
    }
}

impl StyleOptions {
    /// Copy with lo-fi intensity clamped to the renderer's range
    pub fn normalized(mut self) -> Self {
        self.lofi = self.lofi.clamp(LOFI_MIN, LOFI_MAX);
        self
    }

    /// Shallow-merge a JSON object over these options.
    ///
    /// Keys present in `overrides` replace the current values; other keys
    /// keep theirs. Fails when `overrides` is not an object or a value has
    /// the wrong type.
    pub fn merged_with(&self, overrides: &Value) -> Result<Self> {
        let Value::Object(overrides) = overrides else {
            return Err(Error::InvalidInput(
                "style overrides must be a JSON object".to_string(),
            ));
        };

        let mut base = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut base {
            for (key, value) in overrides {
                let key = if key == "textcolor" { "textColor" } else { key.as_str() };
                fields.insert(key.to_string(), value.clone());
            }
        }

        Ok(serde_json::from_value(base)?)
    }
}

/// File-backed cache of the last used style options
#[derive(Debug, Clone)]
pub struct StylePreferences {
    path: PathBuf,
}

impl StylePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache in the platform config directory (`~/.config/bratgen/` on Linux)
    pub fn in_default_location() -> Result<Self> {
        let dir = crate::config::config_dir()?;
        Ok(Self::new(dir.join(PREFERENCES_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load cached options merged over the defaults.
    ///
    /// Never fails: unreadable or malformed caches fall back to defaults.
    pub fn load(&self) -> StyleOptions {
        let defaults = StyleOptions::default();

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No style preferences cached");
                return defaults;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read style preferences, using defaults");
                return defaults;
            }
        };

        let merged = serde_json::from_str::<Value>(&content)
            .map_err(Error::from)
            .and_then(|cached| defaults.merged_with(&cached));

        match merged {
            Ok(options) => options,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt style preferences");
                defaults
            }
        }
    }

    /// Persist options, replacing the previous cache atomically (temp + rename)
    pub fn save(&self, options: &StyleOptions) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(options)?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), "Saved style preferences");
        Ok(())
    }
}
