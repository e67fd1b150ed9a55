use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "zenith", about = "Goal, task hierarchy and streak tracker", version)]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.zenith/zenith.db]
    #[arg(long, env = "ZENITH_DB", global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Set or show the long-term goal
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Period bucket (monthly, weekly, daily)
        #[arg(short, long, default_value = "daily")]
        period: String,
        /// Parent task id
        #[arg(long)]
        parent: Option<String>,
        /// Due date (YYYY-MM-DD or RFC 3339) [default: now]
        #[arg(long)]
        date: Option<String>,
        /// Estimated duration in minutes [default: from config]
        #[arg(long)]
        duration: Option<u32>,
        /// Break duration in minutes [default: from config]
        #[arg(long = "break")]
        break_minutes: Option<u32>,
        /// Remind this many minutes before the due date (0 disables)
        #[arg(long)]
        reminder: Option<u32>,
        /// Priority (low, medium, high, urgent) [default: from config]
        #[arg(long)]
        priority: Option<String>,
        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Task description
        #[arg(short, long)]
        desc: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a task
    Edit {
        /// Task id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        date: Option<String>,
        /// New estimated duration in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// New break duration in minutes (0 clears)
        #[arg(long = "break")]
        break_minutes: Option<u32>,
        /// New reminder lead time in minutes (0 clears)
        #[arg(long)]
        reminder: Option<u32>,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
        /// Replace tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// New description
        #[arg(short, long)]
        desc: Option<String>,
        /// New parent task id
        #[arg(long, conflicts_with = "root")]
        parent: Option<String>,
        /// Detach from its parent
        #[arg(long)]
        root: bool,
    },

    /// Mark a task as completed
    Done {
        /// Task id
        id: String,
    },

    /// Mark a completed task as pending again
    Undo {
        /// Task id
        id: String,
    },

    /// Remove a task and all of its subtasks
    Rm {
        /// Task id
        id: String,
    },

    /// Show task details
    Show {
        /// Task id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tasks
    List {
        /// Display as tree
        #[arg(long)]
        tree: bool,
        /// Filter by period (monthly, weekly, daily)
        #[arg(long)]
        period: Option<String>,
        /// Filter by status (all, completed, pending)
        #[arg(long)]
        status: Option<String>,
        /// Filter by priority
        #[arg(long)]
        priority: Option<String>,
        /// Search title, description and tags
        #[arg(short, long)]
        query: Option<String>,
        /// Only tasks in the current day/week/month window of their period
        #[arg(long)]
        current: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show completion percentages for each period
    Progress {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show completion streaks and counters
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show status messages about the task list
    Insights,

    /// Goal, stats, progress and insights at a glance
    Dashboard,

    /// Export all data
    Export {
        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output path, or - for stdout [default: dated file in the current directory]
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Replace all data with a JSON export
    Import {
        /// Path to a JSON export
        file: String,
    },

    /// Print reminders that are due now
    Remind {
        /// Keep running, checking once a minute
        #[arg(long)]
        follow: bool,
    },
}

#[derive(Subcommand)]
pub enum GoalAction {
    /// Replace the goal
    Set {
        /// Goal title
        title: String,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },
    /// Show the current goal
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}
