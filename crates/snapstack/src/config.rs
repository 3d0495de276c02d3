#![forbid(unsafe_code)]

//! Stack configuration as data.
//!
//! [`StackConfig`] holds the tunables of an [`UndoStack`](crate::UndoStack)
//! that can be expressed without code, so they can be loaded from JSON (or
//! TOML with the `toml-config` feature) at startup.
//!
//! ```json
//! { "max_undos": 50, "paused": false, "filtered_keys": ["en-US", "fr-FR"] }
//! ```
//!
//! Missing fields take their defaults, so `{}` is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use snapstack_observe::KeyFilter;
use tracing::warn;

/// Default bound on retained snapshots.
pub const DEFAULT_MAX_UNDOS: usize = 20;

/// Serializable stack configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Maximum number of snapshots retained, including the current one.
    pub max_undos: usize,
    /// Start paused: only the initial assignment is recorded and announced.
    pub paused: bool,
    /// Key names excluded from observation.
    pub filtered_keys: Vec<String>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            max_undos: DEFAULT_MAX_UNDOS,
            paused: false,
            filtered_keys: Vec::new(),
        }
    }
}

impl StackConfig {
    /// Configuration with the given snapshot bound.
    #[must_use]
    pub fn new(max_undos: usize) -> Self {
        Self {
            max_undos,
            ..Self::default()
        }
    }

    /// Set the initial pause state.
    #[must_use]
    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Set the key names excluded from observation.
    #[must_use]
    pub fn with_filtered_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// The bound actually applied: `max_undos`, raised to 1 if it is 0.
    #[must_use]
    pub fn effective_max_depth(&self) -> usize {
        if self.max_undos == 0 {
            warn!("max_undos = 0 cannot hold the current snapshot; using 1");
            return 1;
        }
        self.max_undos
    }

    /// Filter matching `filtered_keys` exactly.
    #[must_use]
    pub fn key_filter(&self) -> KeyFilter {
        KeyFilter::exact(self.filtered_keys.iter().cloned())
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse from a TOML string.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Render as a single JSON line, for logs.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Errors that can occur when loading a stack configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("I/O error reading stack config: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parse or render error.
    #[error("JSON error in stack config: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML parse error.
    #[cfg(feature = "toml-config")]
    #[error("TOML error in stack config: {0}")]
    Toml(#[from] toml::de::Error),
}
