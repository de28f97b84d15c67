//! Task CLI subcommands.

use clap::Subcommand;

/// Task management commands.
///
/// ## Quick Start
///
/// ```bash
/// personal-mcp task add "Pay rent" --priority high --due 2025-02-01
/// personal-mcp task list --status pending
/// personal-mcp task done 1
/// personal-mcp task rm 1 --yes
/// ```
#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    /// Create a task.
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Priority: high, medium or low
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Due date, free form
        #[arg(long = "due", default_value = "")]
        due_date: String,
    },

    /// List tasks, pending first and by priority.
    List {
        /// Filter: all, pending or completed
        #[arg(short, long, default_value = "all")]
        status: String,

        /// Maximum number of tasks to show
        #[arg(short, long, default_value_t = crate::tasks::DEFAULT_TASK_LIMIT)]
        limit: usize,
    },

    /// Mark a task as completed.
    Done {
        /// Task ID
        id: u64,
    },

    /// Delete a task permanently.
    Rm {
        /// Task ID
        id: u64,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },

    /// Search task titles and descriptions.
    Search {
        /// Text to look for
        query: String,
    },
}
