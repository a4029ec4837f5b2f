//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Driftgate - pre-merge validation for infrastructure-as-code changes.
#[derive(Parser, Debug)]
#[command(name = "driftgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short, long, global = true, env = "DRIFTGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare rendered configuration between two environments.
    ConfigDiff {
        /// Host ids to validate (comma-separated or repeated).
        #[arg(long, value_delimiter = ',', required = true)]
        hosts: Vec<String>,

        /// Target environment (the merge base).
        #[arg(long)]
        target: String,

        /// Incoming environment (the proposed change).
        #[arg(long)]
        incoming: String,

        /// Refresh source content before rendering.
        #[arg(long)]
        refresh: bool,

        /// Override the fetch concurrency limit.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Exit with a failing code when changes are detected.
        #[arg(long)]
        fail_on_changes: bool,
    },

    /// Compare compiled execution plans between two environments.
    PlanDiff {
        /// Host ids to validate (comma-separated or repeated).
        #[arg(long, value_delimiter = ',', required = true)]
        hosts: Vec<String>,

        /// Target environment (the merge base).
        #[arg(long)]
        target: String,

        /// Incoming environment (the proposed change).
        #[arg(long)]
        incoming: String,

        /// Refresh source content before compiling.
        #[arg(long)]
        refresh: bool,

        /// Override the fetch concurrency limit.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Exit with a failing code when changes are detected.
        #[arg(long)]
        fail_on_changes: bool,
    },

    /// Read a secret from Vault.
    Secret {
        /// Path of the secret.
        path: String,

        /// Return only this key of the secret.
        #[arg(long)]
        key: Option<String>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_diff_parsing() {
        let cli = Cli::try_parse_from([
            "driftgate",
            "config-diff",
            "--hosts",
            "web01.local,srv01.local",
            "--target",
            "base",
            "--incoming",
            "dev.change_common",
        ])
        .unwrap();

        match cli.command {
            Commands::ConfigDiff {
                hosts,
                target,
                incoming,
                refresh,
                fail_on_changes,
                ..
            } => {
                assert_eq!(hosts, vec!["web01.local", "srv01.local"]);
                assert_eq!(target, "base");
                assert_eq!(incoming, "dev.change_common");
                assert!(!refresh);
                assert!(!fail_on_changes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_hosts_required() {
        let result = Cli::try_parse_from([
            "driftgate",
            "plan-diff",
            "--target",
            "base",
            "--incoming",
            "dev.pr1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_secret_parsing() {
        let cli = Cli::try_parse_from(["driftgate", "secret", "ci/ghar", "--key", "token"])
            .unwrap();

        match cli.command {
            Commands::Secret { path, key } => {
                assert_eq!(path, "ci/ghar");
                assert_eq!(key.as_deref(), Some("token"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
