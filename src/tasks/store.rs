//! Task store trait and JSON file implementation.

use crate::error::{Error, Result};
use crate::json_file::{InitState, JsonFile};
use crate::tasks::models::{
    CompleteOutcome, DeleteOutcome, Note, NotePage, Priority, StatusFilter, StoreDocument, Task,
    TaskPage, TaskStats,
};
use crate::time::now_iso;
use crate::validation::{parse_tags, validate_string};
use std::path::Path;

/// Default number of tasks in a listing.
pub const DEFAULT_TASK_LIMIT: usize = 20;
/// Default number of notes in a listing.
pub const DEFAULT_NOTE_LIMIT: usize = 10;

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 1000;
const CONTENT_MAX: usize = 5000;

/// Trait for task and note storage operations.
///
/// All methods return a `Result` and may fail with I/O or validation errors.
#[allow(clippy::missing_errors_doc)]
pub trait TaskStore {
    // Tasks
    /// Create a new task. `priority` is parsed leniently.
    fn create_task(
        &self,
        title: &str,
        description: &str,
        priority: &str,
        due_date: &str,
    ) -> Result<Task>;

    /// Get a task by ID.
    fn get_task(&self, id: u64) -> Result<Option<Task>>;

    /// List tasks: pending before completed, then by priority.
    fn list_tasks(&self, status: StatusFilter, limit: usize) -> Result<TaskPage>;

    /// Mark a task complete.
    fn complete_task(&self, id: u64) -> Result<CompleteOutcome>;

    /// Delete a task. Without `confirm` nothing happens.
    fn delete_task(&self, id: u64, confirm: bool) -> Result<DeleteOutcome>;

    /// Case-insensitive substring search over titles and descriptions.
    fn search_tasks(&self, query: &str) -> Result<Vec<Task>>;

    // Notes
    /// Create a note with comma-separated `tags`.
    fn create_note(&self, title: &str, content: &str, tags: &str) -> Result<Note>;

    /// List notes, newest first.
    fn list_notes(&self, limit: usize) -> Result<NotePage>;

    // Utility
    /// All tasks in creation order.
    fn tasks(&self) -> Result<Vec<Task>>;

    /// All notes in creation order.
    fn notes(&self) -> Result<Vec<Note>>;

    /// Aggregate counts.
    fn stats(&self) -> Result<TaskStats>;
}

/// JSON-file-based task store.
///
/// Holds no records in memory; every call reads the file under a lock.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    file: JsonFile,
}

impl JsonTaskStore {
    /// Open the store at `path`, creating an empty document if needed.
    ///
    /// An unreadable file is moved to `<path>.corrupt` and replaced by an
    /// empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = JsonFile::new(path);
        let state = file.initialize::<StoreDocument>()?;
        let store = Self { file };
        if state == InitState::Loaded {
            let doc = store.load()?;
            tracing::info!(
                tasks = doc.tasks.len(),
                notes = doc.notes.len(),
                path = %store.path().display(),
                "task store loaded"
            );
        } else {
            tracing::info!(path = %store.path().display(), ?state, "task store initialized");
        }
        Ok(store)
    }

    /// Get the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn load(&self) -> Result<StoreDocument> {
        let mut doc: StoreDocument = self.file.read()?;
        doc.normalize();
        Ok(doc)
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut StoreDocument) -> Result<R>) -> Result<R> {
        self.file.update(|doc: &mut StoreDocument| {
            doc.normalize();
            let out = apply(doc)?;
            doc.last_updated = Some(now_iso());
            Ok(out)
        })
    }
}

impl TaskStore for JsonTaskStore {
    fn create_task(
        &self,
        title: &str,
        description: &str,
        priority: &str,
        due_date: &str,
    ) -> Result<Task> {
        let title = validate_string("title", title, 1, TITLE_MAX)?;
        let description = validate_string("description", description, 0, DESCRIPTION_MAX)?;
        let priority = Priority::parse_or_default(priority);

        let task = self.mutate(|doc| {
            let task = Task {
                id: doc.next_task_id,
                title,
                description,
                priority,
                due_date: due_date.to_string(),
                completed: false,
                created_at: now_iso(),
                completed_at: None,
            };
            doc.next_task_id += 1;
            doc.tasks.push(task.clone());
            Ok(task)
        })?;

        tracing::info!(id = task.id, title = %task.title, "task created");
        Ok(task)
    }

    fn get_task(&self, id: u64) -> Result<Option<Task>> {
        Ok(self.load()?.tasks.into_iter().find(|t| t.id == id))
    }

    fn list_tasks(&self, status: StatusFilter, limit: usize) -> Result<TaskPage> {
        let mut tasks: Vec<Task> =
            self.load()?.tasks.into_iter().filter(|t| status.matches(t)).collect();
        // Stable, so creation order breaks ties.
        tasks.sort_by_key(|t| (t.completed, t.priority.rank()));

        let remaining = tasks.len().saturating_sub(limit);
        tasks.truncate(limit);
        Ok(TaskPage { status, tasks, remaining })
    }

    fn complete_task(&self, id: u64) -> Result<CompleteOutcome> {
        let outcome = self.mutate(|doc| {
            let task = doc.tasks.iter_mut().find(|t| t.id == id).ok_or(Error::TaskNotFound(id))?;
            if task.completed {
                return Ok(CompleteOutcome::AlreadyCompleted(task.clone()));
            }
            task.completed = true;
            task.completed_at = Some(now_iso());
            Ok(CompleteOutcome::Completed(task.clone()))
        })?;

        if let CompleteOutcome::Completed(task) = &outcome {
            tracing::info!(id, title = %task.title, "task completed");
        }
        Ok(outcome)
    }

    fn delete_task(&self, id: u64, confirm: bool) -> Result<DeleteOutcome> {
        if !confirm {
            return Ok(DeleteOutcome::ConfirmationRequired);
        }
        let task = self.mutate(|doc| {
            let index =
                doc.tasks.iter().position(|t| t.id == id).ok_or(Error::TaskNotFound(id))?;
            Ok(doc.tasks.remove(index))
        })?;

        tracing::warn!(id, title = %task.title, "task deleted");
        Ok(DeleteOutcome::Deleted(task))
    }

    fn search_tasks(&self, query: &str) -> Result<Vec<Task>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .load()?
            .tasks
            .into_iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&query)
                    || t.description.to_lowercase().contains(&query)
            })
            .collect())
    }

    fn create_note(&self, title: &str, content: &str, tags: &str) -> Result<Note> {
        let title = validate_string("title", title, 1, TITLE_MAX)?;
        let content = validate_string("content", content, 1, CONTENT_MAX)?;
        let tags = parse_tags(tags);

        let note = self.mutate(|doc| {
            let now = now_iso();
            let note = Note {
                id: doc.next_note_id,
                title,
                content,
                tags,
                created_at: now.clone(),
                updated_at: now,
            };
            doc.next_note_id += 1;
            doc.notes.push(note.clone());
            Ok(note)
        })?;

        tracing::info!(id = note.id, title = %note.title, "note created");
        Ok(note)
    }

    fn list_notes(&self, limit: usize) -> Result<NotePage> {
        let mut notes = self.load()?.notes;
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let remaining = notes.len().saturating_sub(limit);
        notes.truncate(limit);
        Ok(NotePage { notes, remaining })
    }

    fn tasks(&self) -> Result<Vec<Task>> {
        Ok(self.load()?.tasks)
    }

    fn notes(&self) -> Result<Vec<Note>> {
        Ok(self.load()?.notes)
    }

    #[allow(clippy::cast_precision_loss)]
    fn stats(&self) -> Result<TaskStats> {
        let doc = self.load()?;
        let mut stats =
            TaskStats { total: doc.tasks.len(), notes: doc.notes.len(), ..TaskStats::default() };
        for task in &doc.tasks {
            if task.completed {
                stats.completed += 1;
                continue;
            }
            stats.pending += 1;
            match task.priority {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
        }
        if stats.total > 0 {
            let rate = stats.completed as f64 / stats.total as f64 * 100.0;
            stats.completion_rate = (rate * 10.0).round() / 10.0;
        }
        Ok(stats)
    }
}
