//! Command-line interface for placard.
//!
//! This module provides the CLI structure for the `placard` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ClearCommand, ConfigCommand, ContentArgs, DeleteCommand, HistoryCommand, ReplayCommand,
    SaveCommand, ShowCommand, TimeCommand,
};

/// placard - Full-screen announcements with a synchronized clock
///
/// Shows rich-text announcements across the whole terminal, optionally with
/// a clock corrected against a public time source, and keeps a history of
/// everything shown.
#[derive(Debug, Parser)]
#[command(name = "placard")]
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
    /// Save an announcement and show it full screen
    Show(ShowCommand),

    /// Save an announcement to history without showing it
    Save(SaveCommand),

    /// List saved announcements, newest first
    History(HistoryCommand),

    /// Show a saved announcement again
    Replay(ReplayCommand),

    /// Delete a saved announcement
    Delete(DeleteCommand),

    /// Delete the whole history
    Clear(ClearCommand),

    /// Measure the local clock against the public time source
    Time(TimeCommand),

    /// View configuration
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
