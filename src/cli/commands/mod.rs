//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `sort`: the sorting pass (split, classify, relocate)
//! - `prepare`: tag stripping before key analysis
//! - `report`: tag report and `All - ` marking after key analysis
//! - `probe`: single-file diagnostics
//! - `config`: show or initialise the configuration file

mod config;
mod prepare;
mod probe;
mod report;
mod sort;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::Config;

pub use config::cmd_config;
pub use prepare::cmd_prepare;
pub use probe::cmd_probe;
pub use report::cmd_report;
pub use sort::cmd_sort;

/// Camelot Sort CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: camelot-sort/config.toml in the OS config directory)
    #[arg(long, global = true, env = "CAMELOT_SORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Split long recordings and move one-shots and unlabeled files
    Sort {
        /// Root of the library to sort
        root: PathBuf,
        /// Dry run - show what would be done without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Number of files processed in parallel
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Strip tags and set the title to the file name, before key analysis
    Prepare {
        /// Root of the library to prepare
        root: PathBuf,
        /// Dry run - show what would be done without writing tags
        #[arg(long)]
        dry_run: bool,
    },
    /// Show title, artist and key of every file, after key analysis
    Report {
        /// Root of the library to report on
        root: PathBuf,
        /// Prefix files without a key label with "All - "
        #[arg(long)]
        rename: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how a single file would be classified
    Probe {
        /// Path to the audio file
        file: PathBuf,
    },
    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Sort {
            root,
            dry_run,
            jobs,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref());
            if let Some(jobs) = jobs {
                config.sorting.jobs = *jobs;
            }
            cmd_sort(&config, root, *dry_run, *json)
        }
        Commands::Prepare { root, dry_run } => cmd_prepare(root, *dry_run),
        Commands::Report { root, rename, json } => cmd_report(root, *rename, *json),
        Commands::Probe { file } => {
            let config = load_config(cli.config.as_deref());
            cmd_probe(&config, file)
        }
        Commands::Config { init } => cmd_config(cli.config.as_deref(), *init),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load the configuration from `--config` or the default location.
pub(crate) fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => crate::config::load_from(path),
        None => crate::config::load(),
    }
}

/// Make sure a command root exists before walking it.
pub(crate) fn require_dir(root: &Path) -> anyhow::Result<()> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }
    Ok(())
}
