use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use event_tracker::contract::SortOrder;

/// Event Tracker - personal events with conflict detection and reminders
#[derive(Parser)]
#[command(name = "event-tracker")]
#[command(about = "Event Tracker - personal events with conflict detection and reminders")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    pub print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use an in-memory database
    #[arg(long, global = true)]
    pub mock: bool,

    #[command(flatten)]
    pub auth: Credentials,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Credentials {
    /// Username for commands that act on an account
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Password for --user
    #[arg(short, long, global = true)]
    pub password: Option<String>,
}

/// Event fields shared by `add`, `update` and `conflicts`.
#[derive(Args, Debug, Clone)]
pub struct EventArgs {
    /// Event name
    pub name: String,
    /// Date as M/d/yyyy
    pub date: String,
    /// Time as h:mm AM/PM
    #[arg(long)]
    pub time: Option<String>,
    /// Category id (see `categories`)
    #[arg(long)]
    pub category: Option<i32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Register,
    /// Check credentials
    Login,
    /// Store the phone number used for notifications
    SetPhone { phone: String },
    /// Add an event
    Add {
        #[command(flatten)]
        event: EventArgs,
        /// Save even if the time overlaps other events
        #[arg(long)]
        force: bool,
    },
    /// Replace an event's fields
    Update {
        id: i32,
        #[command(flatten)]
        event: EventArgs,
        #[arg(long)]
        force: bool,
    },
    /// Delete an event
    Delete { id: i32 },
    /// List events
    List {
        #[arg(long, default_value_t = SortOrder::DateAsc, conflicts_with_all = ["category", "from", "to"])]
        sort: SortOrder,
        /// Only events in this category
        #[arg(long)]
        category: Option<i32>,
        /// Earliest date, inclusive (M/d/yyyy)
        #[arg(long)]
        from: Option<String>,
        /// Latest date, inclusive (M/d/yyyy)
        #[arg(long)]
        to: Option<String>,
    },
    /// Show the earliest event
    Next,
    /// Events within the configured horizon
    Upcoming,
    /// Look an event up by exact name, or complete a partial one
    Find {
        name: String,
        #[arg(long)]
        complete: bool,
    },
    /// Events on a date
    OnDate { date: String },
    /// Show events that would overlap a new one
    Conflicts {
        #[command(flatten)]
        event: EventArgs,
        /// Ignore this event id (when editing it)
        #[arg(long)]
        exclude: Option<i32>,
    },
    /// List categories
    Categories,
    /// Create a category
    AddCategory {
        name: String,
        /// Color as #RRGGBB
        #[arg(long)]
        color: Option<String>,
    },
    /// Events per category
    Counts,
    /// Write events to a CSV file, or the summary report with --summary
    Export {
        path: PathBuf,
        #[arg(long)]
        summary: bool,
    },
    /// Suggest a title for a new event
    Suggest {
        /// Hour of day (0-23) the event is planned for; defaults to now
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Check configuration
    Check,
}
