//! CLI module for the Driftgate validation tool.
//!
//! This module provides the command-line interface for validating
//! infrastructure-as-code changes before merge.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
