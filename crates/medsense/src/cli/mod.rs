//! Command-line interface for medsense.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, CheckCommand, ConfigCommand, IdCommand, ImportCommand, ListCommand,
    NotificationsCommand, RunCommand, ShowCommand, StatusCommand,
};

use crate::logging::Verbosity;

/// medsense - Medication reminders for the desktop
///
/// Keep a list of medications with their daily times and get a reminder
/// when each dose is due.
#[derive(Debug, Parser)]
#[command(name = "medsense")]
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
    /// Run the reminder loop in the foreground
    Run(RunCommand),

    /// Add a medication
    Add(AddCommand),

    /// List medications
    List(ListCommand),

    /// Show one medication
    Show(ShowCommand),

    /// Remove a medication
    Remove(IdCommand),

    /// Record that a medication was just taken
    Taken(IdCommand),

    /// Show which reminders are due at a given time
    Check(CheckCommand),

    /// Manage system notification permission
    #[command(subcommand)]
    Notifications(NotificationsCommand),

    /// Print the saved medication list as JSON
    Export,

    /// Replace the medication list from a JSON file
    Import(ImportCommand),

    /// Show storage and permission status
    Status(StatusCommand),

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
