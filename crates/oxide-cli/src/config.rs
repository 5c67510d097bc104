//! CLI configuration management.

use anyhow::Context;
use oxide_materials::PlannerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
///
/// Layered from defaults, the settings file, then `OXIDE_` environment
/// variables (`OXIDE_PLANNER__CONSOLE_PREFIX` for nested keys).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    /// Planner settings.
    #[serde(default)]
    pub planner: PlannerConfig,
    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Log line format on stderr.
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl CliConfig {
    /// Load configuration. An explicit `path` must exist; the default
    /// settings file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();

        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path(),
        };
        if let Some(file) = file {
            builder = builder.add_source(
                config::File::from(file)
                    .format(config::FileFormat::Yaml)
                    .required(path.is_some()),
            );
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix("OXIDE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        config.planner.validate()?;
        Ok(config)
    }

    /// Get the default settings file path.
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("ci", "oxide", "oxide-cli")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_materials::Depth;
    use std::io::Write;

    #[test]
    fn test_settings_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "output_format: json\nplanner:\n  console_prefix: \"[checkout]\"\n  unshallow_steps: [50, 500, unbounded]\n"
        )
        .unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();

        assert!(matches!(config.output_format, OutputFormat::Json));
        assert_eq!(config.planner.console_prefix, "[checkout]");
        assert_eq!(
            config.planner.unshallow_steps,
            vec![Depth::Limited(50), Depth::Limited(500), Depth::Unbounded]
        );
        assert_eq!(config.planner.clean_flags, "-dffx");
    }

    #[test]
    fn test_invalid_escalation_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "planner:\n  unshallow_steps: [500, 50, unbounded]\n").unwrap();

        assert!(CliConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_explicit_settings_file_must_exist() {
        assert!(CliConfig::load(Some(Path::new("/nonexistent/oxide.yaml"))).is_err());
    }
}
