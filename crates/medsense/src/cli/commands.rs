//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::medication::{NewMedication, ScheduleTime};

/// Arguments for `run`.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Seconds between schedule checks (1-60), overriding the configuration
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Never ask for notification permission
    #[arg(long)]
    pub no_prompt: bool,
}

/// Arguments for `add`.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Medication name
    #[arg(short, long)]
    pub name: String,

    /// Dosage, e.g. "100mg"
    #[arg(short, long)]
    pub dosage: String,

    /// Time of day to take it (HH:MM, 24-hour); repeat for several times
    #[arg(short, long = "time", value_name = "HH:MM", required = true, value_parser = parse_time)]
    pub times: Vec<String>,

    /// How often, e.g. "twice daily"
    #[arg(short, long, default_value = "")]
    pub frequency: String,

    /// What it is for
    #[arg(short, long, default_value = "")]
    pub explanation: String,

    /// Known side effects
    #[arg(short, long, default_value = "")]
    pub side_effects: String,
}

impl From<AddCommand> for NewMedication {
    fn from(cmd: AddCommand) -> Self {
        Self {
            name: cmd.name,
            dosage: cmd.dosage,
            frequency: cmd.frequency,
            explanation: cmd.explanation,
            side_effects: cmd.side_effects,
            times: cmd.times,
        }
    }
}

fn parse_schedule_time(value: &str) -> Result<ScheduleTime, String> {
    value.parse().map_err(|e: crate::Error| e.to_string())
}

fn parse_time(value: &str) -> Result<String, String> {
    parse_schedule_time(value).map(|t| t.to_string())
}

/// Arguments for `list`.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Arguments for `show`.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Medication id
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// A command that takes a medication id.
#[derive(Debug, Args)]
pub struct IdCommand {
    /// Medication id
    pub id: String,
}

/// Arguments for `check`.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Time to check (HH:MM); defaults to now
    #[arg(short, long, value_name = "HH:MM", value_parser = parse_schedule_time)]
    pub at: Option<ScheduleTime>,
}

/// Arguments for `import`.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON file holding a medication list
    pub file: PathBuf,
}

/// Arguments for `status`.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Notification permission commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum NotificationsCommand {
    /// Show whether system notifications will be used
    Status,
    /// Allow system notifications
    Enable,
    /// Stop using system notifications
    Disable,
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
