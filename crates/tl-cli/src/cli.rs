//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Time logger.
///
/// Tracks time against named groups with start/stop timers or manual entries,
/// and summarizes it per month.
#[derive(Debug, Parser)]
#[command(name = "tl", version, about, long_about = None)]
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
    /// Manage groups.
    #[command(subcommand)]
    Group(GroupAction),

    /// Start the timer for a group.
    Start {
        /// Group name or ID.
        group: String,
    },

    /// Stop the timer for a group and log the elapsed time.
    Stop {
        /// Group name or ID.
        group: String,
    },

    /// Manage logged entries.
    #[command(subcommand)]
    Entry(EntryAction),

    /// Show running timers.
    Status,

    /// Show the monthly report.
    Report {
        #[command(flatten)]
        scope: ReportScope,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List entries from different groups whose times overlap.
    Overlaps {
        /// Include archived groups.
        #[arg(long)]
        all: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write data to stdout.
    #[command(subcommand)]
    Export(ExportFormat),

    /// Load groups from a JSON file.
    Import {
        /// File with `{"groups": [...]}` or a bare array of groups.
        file: PathBuf,

        /// Keep existing groups and add only unknown ones.
        #[arg(long)]
        merge: bool,
    },
}

/// Group subcommands.
#[derive(Debug, Subcommand)]
pub enum GroupAction {
    /// Create a group.
    Add {
        /// Group name, unique among groups.
        name: String,
    },

    /// List groups with their logged time.
    List {
        /// Include archived groups.
        #[arg(long)]
        all: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete a group and all of its entries.
    Delete {
        /// Group name or ID.
        group: String,
    },

    /// Hide a group from reports and cancel its timer.
    Archive {
        /// Group name or ID.
        group: String,
    },

    /// Restore an archived group.
    Unarchive {
        /// Group name or ID.
        group: String,
    },
}

/// Entry subcommands.
#[derive(Debug, Subcommand)]
pub enum EntryAction {
    /// Log a completed interval.
    Add {
        /// Group name or ID.
        group: String,

        /// Start time (RFC 3339, "YYYY-MM-DD HH:MM", or "2 hours ago").
        #[arg(long)]
        start: String,

        /// End time, same formats as --start.
        #[arg(long)]
        end: String,
    },

    /// List a group's entries with their indexes.
    List {
        /// Group name or ID.
        group: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replace the interval of an entry.
    Edit {
        /// Group name or ID.
        group: String,

        /// Entry index as shown by `tl entry list`.
        index: usize,

        /// New start time.
        #[arg(long)]
        start: String,

        /// New end time.
        #[arg(long)]
        end: String,
    },

    /// Remove an entry.
    Delete {
        /// Group name or ID.
        group: String,

        /// Entry index as shown by `tl entry list`.
        index: usize,
    },
}

/// Export formats.
#[derive(Debug, Subcommand)]
pub enum ExportFormat {
    /// All groups as a JSON document.
    Json,

    /// Every entry as CSV.
    Csv,

    /// Entries counted by a monthly report, as CSV with an hours column.
    ReportCsv {
        #[command(flatten)]
        scope: ReportScope,
    },
}

/// Month and group selection shared by report commands.
#[derive(Debug, Clone, Default, Args)]
pub struct ReportScope {
    /// Month to report (YYYY-MM). Defaults to the current month.
    #[arg(long)]
    pub month: Option<String>,

    /// Shift the month by this many months (e.g. -1 for the previous month).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub offset: i32,

    /// Only include these groups (repeatable). Omit or pass "all" for every group.
    #[arg(long = "group")]
    pub groups: Vec<String>,
}
