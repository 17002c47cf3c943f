//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::record::RecordId;

/// Content argument shared by `show` and `save`.
#[derive(Debug, Args)]
pub struct ContentArgs {
    /// Announcement markup; `-` reads it from stdin
    pub content: String,

    /// Show the synchronized clock with the announcement
    #[arg(long)]
    pub clock: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// What to show
    #[command(flatten)]
    pub announcement: ContentArgs,
}

/// Save command arguments.
#[derive(Debug, Args)]
pub struct SaveCommand {
    /// What to save
    #[command(flatten)]
    pub announcement: ContentArgs,
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Replay command arguments.
#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// Id of the saved announcement
    pub id: RecordId,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the saved announcement
    pub id: RecordId,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Time command arguments.
#[derive(Debug, Args)]
pub struct TimeCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
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
