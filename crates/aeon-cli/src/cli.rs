//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Personal time tracker with overtime accounting.
///
/// Records units of work per day and keeps each day's total and overtime
/// against the configured working hours. Without a subcommand, prints
/// today's report.
#[derive(Debug, Parser)]
#[command(name = "aeon", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
///
/// TIME arguments accept RFC 3339 (`2024-03-04T09:00:00+01:00`), local
/// `YYYY-MM-DDTHH:MM:SS`, local `HH:MM[:SS]` for today, or relative
/// (`20 minutes ago`).
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a unit of work.
    Start {
        /// Start time. Defaults to now.
        time: Option<String>,

        /// Comment for the unit of work.
        #[arg(short, long, default_value = "")]
        comment: String,
    },

    /// Stop the running unit of work.
    Stop {
        /// Stop time. Defaults to now.
        time: Option<String>,
    },

    /// Record a completed unit of work.
    Add {
        start: String,
        stop: String,

        /// Comment for the unit of work.
        #[arg(short, long, default_value = "")]
        comment: String,
    },

    /// Record compensatory time off, reducing the day's overtime.
    Comp {
        start: String,
        stop: String,

        /// Comment for the time off.
        #[arg(short, long, default_value = "")]
        comment: String,
    },

    /// Mark a date as a vacation day.
    Vacation {
        /// Date as YYYY-MM-DD.
        date: NaiveDate,
    },

    /// Show whether a unit is running.
    Status,

    /// Show today's report or the quarterly overview.
    Report {
        /// Weekly totals since the first day of the month two months ago.
        #[arg(long)]
        quarter: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create the ledger for a year, with public holidays marked.
    Init {
        /// Year to create. Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,

        /// Replace an existing ledger.
        #[arg(long)]
        force: bool,
    },
}
