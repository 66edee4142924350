//! Camelot Sort - tidies a DJ sample library keyed by Camelot notation.
//!
//! A sorting pass splits recordings longer than ten minutes into parts,
//! moves files without a key prefix into an unlabeled folder and moves short
//! key-labelled samples into a one-shots folder. Files that are key-labelled
//! and long enough are already sorted and stay where they are.
//!
//! Two tag stages surround external key analysis: `prepare` strips tags
//! beforehand, `report` lists the detected keys afterwards.

pub mod classifier;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod organizer;
pub mod scanner;
pub mod sorter;
pub mod splitter;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log filter from `RUST_LOG`-style directives. The verbosity flag only sets
/// the level used when no directives are given.
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(log_filter(args.verbose, directives.as_deref()))
        .init();

    cli::run_command(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(true, Some("")).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_env_directives_override_verbosity() {
        assert_eq!(log_filter(false, Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(true, Some("error")).max_level_hint(), Some(LevelFilter::ERROR));
        assert_eq!(
            log_filter(false, Some("sorter=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }
}
