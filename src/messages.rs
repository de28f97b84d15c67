//! User-facing text for tool results.
//!
//! Store and service calls return typed outcomes. This module is the one place
//! they become strings: short confirmations are formatted inline, listings go
//! through the templates in [`crate::templates`]. Domain outcomes such as
//! "not found" or "confirmation required" become ordinary messages; every
//! other error is passed back to the caller.

use crate::connections::{Client, ClientStatus, ConnectionStats};
use crate::error::{Error, Result};
use crate::filesystem::{FileDetails, Listing};
use crate::tasks::{CompleteOutcome, DeleteOutcome, Note, NotePage, Priority, Task, TaskPage};
use crate::templates::render;
use crate::time::format_display;
use crate::tools::Tool;
use serde::Serialize;
use tera::Context;

/// Tools listed per client before the rest is summarized.
const TOOLS_SHOWN: usize = 5;

/// Text for a tool call that failed.
#[must_use]
pub fn failure(tool: Tool, err: &Error) -> String {
    format!("Error {}: {err}", tool.action())
}

fn render_trimmed(name: &str, ctx: &Context) -> Result<String> {
    Ok(render(name, ctx)?.trim_end().to_string())
}

const fn priority_icon(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴",
        Priority::Medium => "🟡",
        Priority::Low => "🟢",
    }
}

const fn status_icon(status: ClientStatus) -> &'static str {
    match status {
        ClientStatus::Active => "🟢",
        ClientStatus::Idle => "🟡",
        ClientStatus::Disconnected => "🔴",
    }
}

#[derive(Serialize)]
struct TaskView<'a> {
    id: u64,
    title: &'a str,
    description: &'a str,
    priority: Priority,
    priority_icon: &'static str,
    due_date: &'a str,
    completed: bool,
    completed_at: Option<String>,
}

impl<'a> From<&'a Task> for TaskView<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id,
            title: &task.title,
            description: &task.description,
            priority: task.priority,
            priority_icon: priority_icon(task.priority),
            due_date: &task.due_date,
            completed: task.completed,
            completed_at: task.completed_at.as_deref().map(format_display),
        }
    }
}

#[derive(Serialize)]
struct NoteView<'a> {
    id: u64,
    title: &'a str,
    content: &'a str,
    tags: &'a [String],
    created_at: String,
}

#[derive(Serialize)]
struct ClientView<'a> {
    client_id: &'a str,
    client_name: &'a str,
    status: ClientStatus,
    status_icon: &'static str,
    connected_at: String,
    last_activity: String,
    requests_count: u64,
    tools_used: &'a [String],
    tools_shown: &'a [String],
    tools_more: usize,
}

impl<'a> From<&'a Client> for ClientView<'a> {
    fn from(client: &'a Client) -> Self {
        let shown = client.tools_used.len().min(TOOLS_SHOWN);
        Self {
            client_id: &client.client_id,
            client_name: &client.client_name,
            status: client.status,
            status_icon: status_icon(client.status),
            connected_at: format_display(&client.connected_at),
            last_activity: format_display(&client.last_activity),
            requests_count: client.requests_count,
            tools_used: &client.tools_used,
            tools_shown: &client.tools_used[..shown],
            tools_more: client.tools_used.len() - shown,
        }
    }
}

// Tasks

/// Confirmation for a created task.
#[must_use]
pub fn task_created(task: &Task) -> String {
    format!("Task #{} '{}' created successfully", task.id, task.title)
}

/// Text for a missing task.
#[must_use]
pub fn task_not_found(id: u64) -> String {
    format!("Task #{id} not found")
}

/// Render a task listing.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn task_list(page: &TaskPage) -> Result<String> {
    if page.tasks.is_empty() && page.remaining == 0 {
        return Ok(format!("No tasks found with status '{}'", page.status));
    }
    let mut ctx = Context::new();
    ctx.insert("status", page.status.as_str());
    ctx.insert("tasks", &page.tasks.iter().map(TaskView::from).collect::<Vec<_>>());
    ctx.insert("remaining", &page.remaining);
    render_trimmed("tasks/list.tera", &ctx)
}

/// Flatten the result of completing task `id`.
///
/// # Errors
///
/// Passes through any error other than a missing task.
pub fn task_completion(id: u64, result: Result<CompleteOutcome>) -> Result<String> {
    match result {
        Ok(CompleteOutcome::Completed(task)) => {
            Ok(format!("Task #{} '{}' marked as completed! 🎉", task.id, task.title))
        }
        Ok(CompleteOutcome::AlreadyCompleted(task)) => {
            Ok(format!("Task #{} is already completed", task.id))
        }
        Err(Error::TaskNotFound(_)) => Ok(task_not_found(id)),
        Err(e) => Err(e),
    }
}

/// Flatten the result of deleting task `id`.
///
/// # Errors
///
/// Passes through any error other than a missing task.
pub fn task_deletion(id: u64, result: Result<DeleteOutcome>) -> Result<String> {
    match result {
        Ok(DeleteOutcome::ConfirmationRequired) => Ok(format!(
            "WARNING: permanently delete task #{id}? Call again with confirm=true to proceed."
        )),
        Ok(DeleteOutcome::Deleted(task)) => {
            Ok(format!("Task #{} '{}' permanently deleted", task.id, task.title))
        }
        Err(Error::TaskNotFound(_)) => Ok(task_not_found(id)),
        Err(e) => Err(e),
    }
}

/// Render search results.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn task_search(query: &str, tasks: &[Task]) -> Result<String> {
    if tasks.is_empty() {
        return Ok(format!("No tasks found matching '{query}'"));
    }
    let mut ctx = Context::new();
    ctx.insert("query", query);
    ctx.insert("tasks", &tasks.iter().map(TaskView::from).collect::<Vec<_>>());
    render_trimmed("tasks/search.tera", &ctx)
}

// Notes

/// Confirmation for a created note.
#[must_use]
pub fn note_created(note: &Note) -> String {
    format!("Note #{} '{}' created successfully", note.id, note.title)
}

/// Render a note listing.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn note_list(page: &NotePage) -> Result<String> {
    if page.notes.is_empty() && page.remaining == 0 {
        return Ok("No notes found".to_string());
    }
    let notes: Vec<NoteView<'_>> = page
        .notes
        .iter()
        .map(|n| NoteView {
            id: n.id,
            title: &n.title,
            content: &n.content,
            tags: &n.tags,
            created_at: format_display(&n.created_at),
        })
        .collect();
    let mut ctx = Context::new();
    ctx.insert("notes", &notes);
    ctx.insert("remaining", &page.remaining);
    render_trimmed("notes/list.tera", &ctx)
}

// Files

/// Confirmation for a written file.
#[must_use]
pub fn file_written(path: &str, chars: usize) -> String {
    format!("File {path} saved successfully ({chars} characters)")
}

fn listing(heading: String, listing: &Listing) -> Result<String> {
    let mut ctx = Context::new();
    ctx.insert("heading", &heading);
    ctx.insert("entries", &listing.entries);
    ctx.insert("remaining", &listing.remaining());
    render_trimmed("files/listing.tera", &ctx)
}

/// Render a directory listing.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn directory_listing(result: &Listing) -> Result<String> {
    if result.entries.is_empty() {
        return Ok(format!("Directory is empty: {}", result.dir));
    }
    listing(format!("Contents of {}:", result.dir), result)
}

/// Render file search results.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn file_search(pattern: &str, result: &Listing) -> Result<String> {
    if result.entries.is_empty() {
        return Ok(format!("No files matching '{pattern}' in {}", result.dir));
    }
    listing(format!("Files matching '{pattern}':"), result)
}

/// Render file details.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn file_info(details: &FileDetails) -> Result<String> {
    let mut ctx = Context::new();
    ctx.insert("info", details);
    render_trimmed("files/info.tera", &ctx)
}

/// Text for a file deletion, or the confirmation prompt if nothing was deleted.
#[must_use]
pub fn file_deletion(path: &str, deleted: bool) -> String {
    if deleted {
        format!("File {path} deleted successfully")
    } else {
        format!("WARNING: permanently delete '{path}'? Call again with confirm=true to proceed.")
    }
}

/// Confirmation for a created directory.
#[must_use]
pub fn directory_created(path: &str) -> String {
    format!("Directory {path} created successfully")
}

// Connections

/// Render a client listing.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn connection_list(status: &str, clients: &[Client]) -> Result<String> {
    if clients.is_empty() {
        return Ok(format!("No connections found with status: {status}"));
    }
    let mut ctx = Context::new();
    ctx.insert("clients", &clients.iter().map(ClientView::from).collect::<Vec<_>>());
    render_trimmed("connections/list.tera", &ctx)
}

/// Render connection statistics.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn connection_stats(stats: &ConnectionStats) -> Result<String> {
    let mut ctx = Context::new();
    ctx.insert("stats", stats);
    ctx.insert("timestamp", &format_display(&stats.timestamp));
    render_trimmed("connections/stats.tera", &ctx)
}

/// Render details for one client, or a not-found message.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn connection_details(client_id: &str, client: Option<&Client>) -> Result<String> {
    let Some(client) = client else {
        return Ok(format!("Client not found: {client_id}"));
    };
    let mut ctx = Context::new();
    ctx.insert("client", &ClientView::from(client));
    render_trimmed("connections/details.tera", &ctx)
}
