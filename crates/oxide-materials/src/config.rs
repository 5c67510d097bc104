//! Planner configuration.

use oxide_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Fetch depth used when deepening a shallow clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DepthRepr", into = "DepthRepr")]
pub enum Depth {
    Limited(u32),
    Unbounded,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DepthRepr {
    Limited(u32),
    Named(String),
}

impl TryFrom<DepthRepr> for Depth {
    type Error = String;

    fn try_from(repr: DepthRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            DepthRepr::Limited(0) => Err("depth must be positive".to_string()),
            DepthRepr::Limited(n) => Ok(Depth::Limited(n)),
            DepthRepr::Named(name) if name == "unbounded" => Ok(Depth::Unbounded),
            DepthRepr::Named(name) => Err(format!("unknown depth: {name}")),
        }
    }
}

impl From<Depth> for DepthRepr {
    fn from(depth: Depth) -> Self {
        match depth {
            Depth::Limited(n) => DepthRepr::Limited(n),
            Depth::Unbounded => DepthRepr::Named("unbounded".to_string()),
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Depth::Limited(n) => write!(f, "{n}"),
            Depth::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Planner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Depths tried in order until the target revision is reachable.
    #[serde(default = "default_unshallow_steps")]
    pub unshallow_steps: Vec<Depth>,
    /// Prefix of every console line the tree prints.
    #[serde(default = "default_console_prefix")]
    pub console_prefix: String,
    /// Flags passed to `git clean`.
    #[serde(default = "default_clean_flags")]
    pub clean_flags: String,
}

fn default_unshallow_steps() -> Vec<Depth> {
    vec![Depth::Limited(100), Depth::Unbounded]
}

fn default_console_prefix() -> String {
    "[sync]".to_string()
}

fn default_clean_flags() -> String {
    "-dffx".to_string()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            unshallow_steps: default_unshallow_steps(),
            console_prefix: default_console_prefix(),
            clean_flags: default_clean_flags(),
        }
    }
}

impl PlannerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Escalation depths must strictly increase and end unbounded.
    pub fn validate(&self) -> Result<()> {
        if self.unshallow_steps.last() != Some(&Depth::Unbounded) {
            return Err(Error::Config(
                "unshallow_steps must end with 'unbounded'".to_string(),
            ));
        }
        let limited: Vec<u32> = self
            .unshallow_steps
            .iter()
            .filter_map(|d| match d {
                Depth::Limited(n) => Some(*n),
                Depth::Unbounded => None,
            })
            .collect();
        if limited.len() + 1 != self.unshallow_steps.len()
            || limited.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(Error::Config(
                "unshallow_steps must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_unshallow_steps(mut self, steps: Vec<Depth>) -> Self {
        self.unshallow_steps = steps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(
            config.unshallow_steps,
            vec![Depth::Limited(100), Depth::Unbounded]
        );
    }

    #[test]
    fn test_parses_depth_list() {
        let config =
            PlannerConfig::from_yaml("unshallow_steps: [10, 500, unbounded]\n").unwrap();
        assert_eq!(
            config.unshallow_steps,
            vec![Depth::Limited(10), Depth::Limited(500), Depth::Unbounded]
        );
    }

    #[test]
    fn test_rejects_bad_escalation() {
        assert!(PlannerConfig::from_yaml("unshallow_steps: [100]\n").is_err());
        assert!(PlannerConfig::from_yaml("unshallow_steps: [500, 10, unbounded]\n").is_err());
        assert!(PlannerConfig::from_yaml("unshallow_steps: [unbounded, 10, unbounded]\n").is_err());
        assert!(PlannerConfig::from_yaml("unshallow_steps: [0, unbounded]\n").is_err());
    }
}
