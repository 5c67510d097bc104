//! Command handlers.

use anyhow::Context;
use chrono::Utc;
use console::style;
use oxide_core::material::Material;
use oxide_core::revision::{Modification, Revision, RevisionContext};
use oxide_materials::{MaterialPlanner, SyncStep, render};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{CliConfig, OutputFormat};

/// What `oxide plan` prints in structured formats. Carries rendered lines
/// only, so secrets never reach the output.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub material: String,
    pub revision: String,
    pub dest: PathBuf,
    pub commands: Vec<String>,
}

/// Build the command tree for a material definition file.
pub fn build_plan(
    config: &CliConfig,
    material_path: &Path,
    revision: &str,
    modified: &[String],
    dest: &Path,
) -> anyhow::Result<(Material, SyncStep)> {
    let content = std::fs::read_to_string(material_path)
        .with_context(|| format!("Failed to read {}", material_path.display()))?;
    let material: Material = serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid material in {}", material_path.display()))?;

    let now = Utc::now();
    let modifications = if modified.is_empty() {
        vec![Modification::new(revision, now)]
    } else {
        modified.iter().map(|r| Modification::new(r.as_str(), now)).collect()
    };
    let context = RevisionContext::new(Revision::new(revision)).with_modifications(modifications);

    let tree = MaterialPlanner::new(config.planner.clone()).plan(&material, dest, &context);
    info!(
        material = %material.display_name(),
        revision = %revision,
        steps = tree.walk().len(),
        "Planned material sync"
    );
    Ok((material, tree))
}

impl PlanReport {
    pub fn new(material: &Material, revision: &str, dest: &Path, tree: &SyncStep) -> Self {
        Self {
            material: material.display_name(),
            revision: revision.to_string(),
            dest: dest.to_path_buf(),
            commands: render(tree).lines().map(str::to_string).collect(),
        }
    }
}

/// Print the synchronization plan.
pub fn plan(
    config: &CliConfig,
    material_path: &Path,
    revision: &str,
    modified: &[String],
    dest: &Path,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let (material, tree) = build_plan(config, material_path, revision, modified, dest)?;

    match format.unwrap_or(config.output_format) {
        OutputFormat::Text => {
            println!(
                "{} Syncing {} to {}",
                style("▶").cyan(),
                style(material.display_name()).bold(),
                style(revision).dim()
            );
            print!("{}", render(&tree));
        }
        OutputFormat::Json => {
            let report = PlanReport::new(&material, revision, dest, &tree);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Yaml => {
            let report = PlanReport::new(&material, revision, dest, &tree);
            print!("{}", serde_yaml::to_string(&report)?);
        }
    }
    Ok(())
}

/// Show the effective configuration.
pub fn show_config(config: &CliConfig) -> anyhow::Result<()> {
    println!("{}", style("Configuration").bold());
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

/// Print where the settings file is read from.
pub fn config_path() -> anyhow::Result<()> {
    match CliConfig::config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("{} Could not determine config directory", style("!").yellow()),
    }
    Ok(())
}
