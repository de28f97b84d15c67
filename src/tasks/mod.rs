//! Task and note management.
//!
//! This module provides a small personal task tracker with:
//! - Tasks with title, description, priority, due date and completion state
//! - Free-standing notes with tags
//! - Case-insensitive search over tasks
//!
//! Records live in a single JSON document that is re-read under a file lock on
//! every call, so several processes can share one store.
//!
//! # Example
//!
//! ```no_run
//! use personal_mcp::tasks::{JsonTaskStore, StatusFilter, TaskStore};
//!
//! let store = JsonTaskStore::new("/tmp/tasks.json").unwrap();
//!
//! let task = store.create_task("Buy milk", "2 liters", "high", "2025-01-20").unwrap();
//! store.complete_task(task.id).unwrap();
//!
//! let page = store.list_tasks(StatusFilter::Pending, 20).unwrap();
//! let results = store.search_tasks("milk").unwrap();
//! ```

pub mod models;
pub mod store;

pub use models::{
    CompleteOutcome, DeleteOutcome, Note, NotePage, Priority, StatusFilter, StoreDocument, Task,
    TaskPage, TaskStats,
};
pub use store::{JsonTaskStore, TaskStore, DEFAULT_NOTE_LIMIT, DEFAULT_TASK_LIMIT};
