//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use logbook_core::MAX_WINDOW_DAYS;

/// Driver duty logbook.
///
/// Derives the 24-hour duty grid from recorded status changes and totals
/// time per duty status.
#[derive(Debug, Parser)]
#[command(name = "logbook", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the hourly table and duty grid for one day.
    Timeline {
        #[command(flatten)]
        day: DayArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show time per duty status for one day.
    Summary {
        #[command(flatten)]
        day: DayArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Roll daily totals up over the last N days.
    Window {
        /// JSON file with a driver's daily logs.
        #[arg(long)]
        logs: PathBuf,

        /// Last day of the window (YYYY-MM-DD, today, yesterday, "N days ago").
        #[arg(long, default_value = "today")]
        date: String,

        /// Number of days in the window (defaults to config).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
        days: Option<u32>,

        /// Reference timezone (defaults to config).
        #[arg(long)]
        tz: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Arguments selecting one driver-day of events.
#[derive(Debug, clap::Args)]
pub struct DayArgs {
    /// JSON array or JSONL file of duty status events.
    #[arg(long)]
    pub events: PathBuf,

    /// Day to derive (YYYY-MM-DD, today, yesterday, "N days ago").
    #[arg(long, default_value = "today")]
    pub date: String,

    /// Reference timezone (defaults to config).
    #[arg(long)]
    pub tz: Option<String>,

    /// JSON file of precomputed hourly samples that override derived hours.
    #[arg(long)]
    pub samples: Option<PathBuf>,
}
