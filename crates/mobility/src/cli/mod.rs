//! Command-line interface for mobility.
//!
//! This module provides the CLI structure for the `mobility` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DestinationsCommand, NavigateCommand, PrefsCommand, RoutesCommand,
};

use crate::logging::Verbosity;

/// mobility - accessibility preferences and saved routes for indoor navigation
///
/// Manages the settings and saved routes used by the Enhancing Mobility
/// navigation assistant.
#[derive(Debug, Parser)]
#[command(name = "mobility")]
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

    /// Keep everything in memory; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// View or change preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),

    /// Manage saved routes
    #[command(subcommand)]
    Routes(RoutesCommand),

    /// Manage frequent destinations
    #[command(subcommand)]
    Destinations(DestinationsCommand),

    /// Start navigating between two locations
    Navigate(NavigateCommand),

    /// Show the calibration instruction
    Calibrate,

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "mobility");
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["mobility", "calibrate"]).verbosity(), Verbosity::Normal);
        assert_eq!(
            parse(&["mobility", "-q", "calibrate"]).verbosity(),
            Verbosity::Quiet
        );
        assert_eq!(
            parse(&["mobility", "-v", "calibrate"]).verbosity(),
            Verbosity::Verbose
        );
        assert_eq!(
            parse(&["mobility", "-vv", "calibrate"]).verbosity(),
            Verbosity::Trace
        );
    }

    #[test]
    fn test_parse_prefs_set() {
        let cli = parse(&["mobility", "prefs", "set", "text_size", "large"]);
        assert!(matches!(
            cli.command,
            Command::Prefs(PrefsCommand::Set { ref field, ref value })
                if field == "text_size" && value == "large"
        ));
    }

    #[test]
    fn test_parse_prefs_backup_to_stdout() {
        let cli = parse(&["mobility", "prefs", "backup", "-o", "-"]);
        assert!(matches!(
            cli.command,
            Command::Prefs(PrefsCommand::Backup { output: Some(ref p) }) if p.as_os_str() == "-"
        ));
    }

    #[test]
    fn test_parse_navigate() {
        let cli = parse(&["mobility", "navigate", "Library", "Gym", "--save"]);
        match cli.command {
            Command::Navigate(cmd) => {
                assert_eq!(cmd.from, "Library");
                assert_eq!(cmd.to, "Gym");
                assert!(cmd.save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = parse(&[
            "mobility",
            "routes",
            "list",
            "--ephemeral",
            "-c",
            "/custom/config.toml",
        ]);
        assert!(cli.ephemeral);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_destinations_remove() {
        let cli = parse(&["mobility", "destinations", "remove", "1", "3"]);
        assert!(matches!(
            cli.command,
            Command::Destinations(DestinationsCommand::Remove { ref indices }) if indices == &[1, 3]
        ));
    }
}
