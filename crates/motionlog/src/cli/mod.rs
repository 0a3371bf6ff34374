//! Command-line interface for motionlog.
//!
//! This module provides the CLI structure for the `motionlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, DumpCommand, OutputFormat, RunCommand};

/// motionlog - Log motion-sensor telemetry, stop hard on bad data
///
/// Samples a 6-axis motion sensor at a fixed period and appends every
/// reading to a durable log. The first untrustworthy reading dumps the log,
/// reports the initial pose and halts for good.
#[derive(Debug, Parser)]
#[command(name = "motionlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the sampling pipeline until a fault halts it
    Run(RunCommand),

    /// Print the stored log with entry numbers
    Dump(DumpCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Config(ConfigCommand::Path),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "motionlog");
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["motionlog", "run"]).unwrap();
        let Command::Run(run) = cli.command else {
            panic!("expected run command");
        };
        assert!(run.fault_at.is_none());
        assert_eq!(run.format, OutputFormat::Plain);
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let args = [
            "motionlog",
            "run",
            "--fault-at",
            "5",
            "--period-ms",
            "100",
            "--log",
            "/tmp/m.txt",
            "-f",
            "json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Run(run) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(run.fault_at, Some(5));
        assert_eq!(run.period_ms, Some(100));
        assert_eq!(run.log, Some(PathBuf::from("/tmp/m.txt")));
        assert_eq!(run.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_dump() {
        let cli = Cli::try_parse_from(["motionlog", "dump", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Dump(DumpCommand {
                format: OutputFormat::Json,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli =
            Cli::try_parse_from(["motionlog", "-c", "/custom/config.toml", "config", "path"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["motionlog", "-vv", "dump"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["motionlog", "-q", "dump"]).unwrap();
        assert!(cli.quiet);
    }
}
