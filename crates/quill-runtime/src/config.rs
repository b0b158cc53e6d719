#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! All tunables live in one [`EditorConfig`] that can be loaded from TOML
//! or JSON at startup. Missing keys take their defaults, so an empty file
//! is a valid configuration.
//!
//! ```toml
//! # quill.toml
//! max_undo = 100
//! autosave_delay_ms = 2000
//! placeholder = "<p></p>"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::{DEFAULT_MAX_UNDO, HistoryConfig};
use crate::notification::QueueConfig;

/// Storage key the document is autosaved under.
pub const DEFAULT_AUTOSAVE_KEY: &str = "autosavedContent";

/// Content of a fresh document.
pub const DEFAULT_PLACEHOLDER: &str = "<p>Start typing your document here...</p>";

/// Tunable editor parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo steps kept.
    pub max_undo: usize,
    /// Target spacing of the periodic history capture.
    pub capture_interval_ms: u64,
    /// Quiet period after the last edit before autosaving.
    pub autosave_delay_ms: u64,
    /// How long a notification stays visible.
    pub notification_duration_ms: u64,
    /// Maximum notifications visible at once.
    pub max_visible_notifications: usize,
    /// Storage key for the autosaved document.
    pub autosave_key: String,
    /// Markup of a new, empty document.
    pub placeholder: String,
    /// Write a pending autosave immediately when the session ends.
    pub flush_on_dispose: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
            capture_interval_ms: 1000,
            autosave_delay_ms: 5000,
            notification_duration_ms: 3000,
            max_visible_notifications: 3,
            autosave_key: DEFAULT_AUTOSAVE_KEY.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            flush_on_dispose: true,
        }
    }
}

impl EditorConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load a file by extension (`.json` is JSON, anything else TOML) and
    /// reject it unless it validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_file(path)?
        } else {
            Self::from_toml_file(path)?
        };
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        tracing::debug!(target: "quill.config", path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Every constraint violation. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_undo == 0 {
            errors.push("max_undo must be > 0".into());
        }
        if self.capture_interval_ms == 0 {
            errors.push("capture_interval_ms must be > 0".into());
        }
        if self.autosave_delay_ms == 0 {
            errors.push("autosave_delay_ms must be > 0".into());
        }
        if self.notification_duration_ms == 0 {
            errors.push("notification_duration_ms must be > 0".into());
        }
        if self.max_visible_notifications == 0 {
            errors.push("max_visible_notifications must be > 0".into());
        }
        if self.autosave_key.trim().is_empty() {
            errors.push("autosave_key must not be blank".into());
        }

        errors
    }

    #[must_use]
    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture_interval_ms)
    }

    #[must_use]
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    #[must_use]
    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    #[must_use]
    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig::new(self.max_undo)
    }

    #[must_use]
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig::new()
            .max_visible(self.max_visible_notifications)
            .duration(self.notification_duration())
    }
}

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
