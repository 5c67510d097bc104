//! Dispatcher configuration.

use oxide_core::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Number of work finders answering idle signals.
    #[serde(default = "default_finder_count")]
    pub finder_count: usize,
    /// Queue group the finders share, so each idle signal is answered once.
    #[serde(default = "default_finder_group")]
    pub finder_group: String,
}

fn default_finder_count() -> usize {
    2
}

fn default_finder_group() -> String {
    "work-finders".to_string()
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            finder_count: default_finder_count(),
            finder_group: default_finder_group(),
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
