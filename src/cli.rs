//! CLI argument parsing for taskline.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tl",
    about = "A dependency-aware task list that picks what to work on next",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/taskline/logs/taskline.log"
)]
pub struct Cli {
    /// Path to the task file (default: tasks/tasks.json, or $TASKLINE_FILE)
    #[arg(short = 'f', long, global = true)]
    pub file: Option<PathBuf>,

    /// Path to a YAML config file (default: ~/.config/taskline/taskline.yml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all tasks
    List,

    /// Show details of a specific task
    Show {
        /// Task ID
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
    },

    /// Update task status (pending/done)
    SetStatus {
        /// Task ID
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,

        /// New status: pending or done
        status: Option<String>,
    },

    /// Show the next available task to work on
    Next,

    /// Create an empty task file if none exists
    Init,

    /// Add a new task
    Add {
        /// Task title
        title: String,

        /// Priority (high, medium, low)
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Description
        #[arg(short = 'D', long)]
        description: Option<String>,

        /// Implementation details
        #[arg(long)]
        details: Option<String>,

        /// How the task will be verified
        #[arg(long)]
        test_strategy: Option<String>,

        /// IDs of tasks this one depends on (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        deps: Option<Vec<String>>,
    },

    /// Show every task that is ready to work on
    Ready,

    /// Show pending tasks and what blocks them
    Blocked,

    /// Check the dependency graph for duplicates, missing tasks and cycles
    Validate,
}

/// Parse failures that should print the usage and exit successfully:
/// an unrecognized command or no command at all.
pub fn usage_only(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::InvalidSubcommand | ErrorKind::MissingSubcommand | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}
