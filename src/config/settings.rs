//! Settings schema and loading.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, RevkeepError};

/// Runtime settings of the change-tracking core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for snapshot copies.
    ///
    /// Defaults to a `revkeep` directory in the system temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,

    /// Also prune resources that are freshly added (without history).
    pub prune_added: bool,

    /// Name of the administrative directory, never supervised.
    pub admin_dir: String,

    /// Regexes matched against container names to mark them ignored.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore_patterns: Vec<String>,

    /// Maximum number of pending events in a coalescing queue.
    pub event_queue_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            prune_added: false,
            admin_dir: ".svn".to_string(),
            ignore_patterns: Vec::new(),
            event_queue_limit: 256,
        }
    }
}

impl Settings {
    /// Parse settings from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| RevkeepError::ConfigParseError {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })
    }

    /// Load and validate settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RevkeepError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content).map_err(|e| match e {
            RevkeepError::ConfigParseError { message, .. } => RevkeepError::ConfigParseError {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check values that deserialization alone cannot.
    pub fn validate(&self) -> Result<()> {
        if self.admin_dir.trim().is_empty() {
            return Err(RevkeepError::ConfigValidationError {
                message: "admin_dir must not be empty".to_string(),
            });
        }

        if self.event_queue_limit == 0 {
            return Err(RevkeepError::ConfigValidationError {
                message: "event_queue_limit must be at least 1".to_string(),
            });
        }

        for pattern in &self.ignore_patterns {
            if let Err(e) = Regex::new(pattern) {
                return Err(RevkeepError::ConfigValidationError {
                    message: format!("Invalid ignore pattern '{}': {}", pattern, e),
                });
            }
        }

        Ok(())
    }

    /// Directory under which snapshot sessions are created.
    pub fn snapshot_base(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("revkeep"))
    }
}
