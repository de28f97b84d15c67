//! Task and note record types.

use serde::{Deserialize, Serialize};

/// Task priority levels.
///
/// Unknown strings decode as [`Priority::Medium`], so records written by
/// older clients with free-form priorities still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    /// High priority.
    High,
    /// Medium priority (default).
    #[default]
    Medium,
    /// Low priority.
    Low,
}

impl Priority {
    /// All priorities, most important first.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Sort rank (0 = most important).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    /// Parse a priority, falling back to medium for anything unrecognized.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    /// Get the string representation of the priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        Self::parse_or_default(&s)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which tasks a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Tasks not yet completed.
    Pending,
    /// Completed tasks.
    Completed,
}

impl StatusFilter {
    /// Parse a filter, falling back to [`StatusFilter::All`] for anything
    /// unrecognized.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            _ => Self::All,
        }
    }

    /// Whether `task` passes this filter.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }

    /// Get the string representation of the filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned at creation and never reused.
    pub id: u64,
    /// Short title describing the task.
    pub title: String,
    /// Detailed description of the task.
    #[serde(default)]
    pub description: String,
    /// Priority level.
    #[serde(default)]
    pub priority: Priority,
    /// Free-form due date, not validated.
    #[serde(default)]
    pub due_date: String,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
    /// ISO 8601 timestamp when the task was created.
    pub created_at: String,
    /// ISO 8601 timestamp when the task was completed, if it has been.
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// A free-standing note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier, from its own counter.
    pub id: u64,
    /// Note title.
    pub title: String,
    /// Note body.
    pub content: String,
    /// Tags in the order they were given.
    #[serde(default)]
    pub tags: Vec<String>,
    /// ISO 8601 timestamp when the note was created.
    pub created_at: String,
    /// ISO 8601 timestamp of the last change; equal to `created_at` since
    /// notes cannot be edited.
    pub updated_at: String,
}

const fn first_id() -> u64 {
    1
}

/// The whole persisted store document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Tasks in creation order.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Notes in creation order.
    #[serde(default)]
    pub notes: Vec<Note>,
    /// Id for the next task.
    #[serde(default = "first_id")]
    pub next_task_id: u64,
    /// Id for the next note.
    #[serde(default = "first_id")]
    pub next_note_id: u64,
    /// ISO 8601 timestamp of the last write.
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            notes: Vec::new(),
            next_task_id: first_id(),
            next_note_id: first_id(),
            last_updated: None,
        }
    }
}

impl StoreDocument {
    /// Bring the id counters up to at least one past the largest stored id.
    pub fn normalize(&mut self) {
        if let Some(max) = self.tasks.iter().map(|t| t.id).max() {
            self.next_task_id = self.next_task_id.max(max + 1);
        }
        if let Some(max) = self.notes.iter().map(|n| n.id).max() {
            self.next_note_id = self.next_note_id.max(max + 1);
        }
    }
}

/// One page of a task listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    /// The filter that produced this page.
    pub status: StatusFilter,
    /// Tasks shown, in display order.
    pub tasks: Vec<Task>,
    /// Matching tasks not shown because of the limit.
    pub remaining: usize,
}

/// One page of a note listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePage {
    /// Notes shown, newest first.
    pub notes: Vec<Note>,
    /// Notes not shown because of the limit.
    pub remaining: usize,
}

/// Result of completing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// The task was marked complete.
    Completed(Task),
    /// The task was already complete; nothing changed.
    AlreadyCompleted(Task),
}

/// Result of deleting a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The caller did not confirm; nothing was looked up or changed.
    ConfirmationRequired,
    /// The task was removed.
    Deleted(Task),
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TaskStats {
    /// Number of tasks.
    pub total: usize,
    /// Tasks not completed.
    pub pending: usize,
    /// Tasks completed.
    pub completed: usize,
    /// Pending high-priority tasks.
    pub high: usize,
    /// Pending medium-priority tasks.
    pub medium: usize,
    /// Pending low-priority tasks.
    pub low: usize,
    /// Number of notes.
    pub notes: usize,
    /// Completed tasks as a percentage of all tasks, one decimal place.
    pub completion_rate: f64,
}
