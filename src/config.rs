use serde::{Deserialize, Serialize};
use std::path::Path;

/// Text stored for a field when none of its source columns hold a value
pub const DEFAULT_MISSING_PLACEHOLDER: &str = "undefined";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings for reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub missing_placeholder: String,
    /// Re-verify the discrepancy counter after every mutation
    pub check_invariants: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            missing_placeholder: DEFAULT_MISSING_PLACEHOLDER.to_string(),
            check_invariants: cfg!(debug_assertions),
        }
    }
}

impl ReconcileConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path: display, source }),
        };

        Self::from_json(&text).map_err(|source| ConfigError::Parse { path: display, source })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
