//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Run command arguments.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Log file to append to (overrides configuration)
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Inject a NaN reading on this cycle
    #[arg(long, value_name = "CYCLE")]
    pub fault_at: Option<u64>,

    /// Sample period in milliseconds (overrides configuration)
    #[arg(long, value_name = "MS")]
    pub period_ms: Option<u64>,

    /// Output format for the halt report
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Dump command arguments.
#[derive(Debug, Args)]
pub struct DumpCommand {
    /// Log file to read (overrides configuration)
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}
