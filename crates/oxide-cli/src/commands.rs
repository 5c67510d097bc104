//! CLI command definitions.

use clap::Subcommand;
use std::path::PathBuf;

use crate::config::OutputFormat;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the commands that bring a working copy to a revision
    Plan {
        /// Material definition (YAML)
        material: PathBuf,

        /// Revision to check out
        #[arg(short, long)]
        revision: String,

        /// Revisions in the change set, newest first
        #[arg(short, long, value_delimiter = ',')]
        modified: Vec<String>,

        /// Directory the material is synchronized into
        #[arg(short, long, default_value = ".")]
        dest: PathBuf,

        /// Output format, overriding the settings file
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the settings file location
    Path,
}
