//! Command-line interface for camelot-sort.
//!
//! This module provides the sort engine and the tag stages around it as
//! subcommands.

mod commands;

pub use commands::{Cli, Commands, run_command};
