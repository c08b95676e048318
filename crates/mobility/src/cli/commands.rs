//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Preference commands.
#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Show every preference
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Set one preference (e.g. `set text_size large`)
    Set {
        /// Field name, either `text_size` or `TextSize` style
        field: String,

        /// New value; lists are comma separated
        value: String,
    },

    /// Remove all stored preferences and reset to defaults
    Clear {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Export a backup of all preferences
    Backup {
        /// Output file (`-` for stdout). Defaults to a timestamped file in the
        /// backup directory
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Merge a backup into the current preferences
    Restore {
        /// Backup file to read
        file: PathBuf,
    },
}

/// Saved route commands.
#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List saved routes
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Save a route
    Add {
        /// Starting location
        from: String,

        /// Destination
        to: String,
    },

    /// Delete routes by position (as shown by `list`)
    Delete {
        /// Positions to delete
        #[arg(required = true)]
        indices: Vec<usize>,
    },

    /// Delete every saved route
    Clear {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// Frequent destination commands.
#[derive(Debug, Subcommand)]
pub enum DestinationsCommand {
    /// List frequent destinations
    List,

    /// Add a frequent destination
    Add {
        /// Destination label
        label: String,
    },

    /// Remove destinations by position (as shown by `list`)
    Remove {
        /// Positions to remove
        #[arg(required = true)]
        indices: Vec<usize>,
    },
}

/// Navigate command arguments.
#[derive(Debug, Args)]
pub struct NavigateCommand {
    /// Starting location
    pub from: String,

    /// Destination
    pub to: String,

    /// Save this route
    #[arg(short, long)]
    pub save: bool,
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

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file (uses default if not specified)
        file: Option<PathBuf>,
    },
}
