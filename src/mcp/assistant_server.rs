//! MCP server exposing the assistant tools.
//!
//! Every handler goes through [`AssistantServer::dispatch`], which records
//! activity for the configured client, logs the call, times it, and turns
//! errors into error results. Nothing a tool does can take the server down.

// The rmcp `#[tool(aggr)]` macro requires ownership of input structs,
// making pass-by-value necessary for all tool handler functions.
#![allow(clippy::needless_pass_by_value)]

use crate::config::Settings;
use crate::connections::{ClientStatus, ConnectionMonitor};
use crate::filesystem::{FileSystem, DEFAULT_SEARCH_RESULTS};
use crate::logging::ToolCallGuard;
use crate::messages;
use crate::tasks::{JsonTaskStore, StatusFilter, TaskStore, DEFAULT_NOTE_LIMIT, DEFAULT_TASK_LIMIT};
use crate::tools::Tool;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::tool;
use rmcp::Error as McpError;
use schemars::JsonSchema;
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;

/// Instructions for the MCP server, shown to clients using this server.
const INSTRUCTIONS: &str = "Personal assistant server.

Tasks have a priority (high, medium, low) and an optional free-form due date. \
Listings show pending tasks first, highest priority first. Deleting a task \
requires calling delete_task again with confirm=true.

Notes hold free text with comma-separated tags and are listed newest first.

Filesystem tools only work inside the directories the server was configured \
with. Relative paths are resolved against the first of them. Existing files \
are only replaced when overwrite=true, and deletions require confirm=true.

Connection tools report which clients have used this server and how often.";

/// Input for creating a task.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTaskInput {
    /// Task title (1-200 characters).
    pub title: String,
    /// Task description (up to 1000 characters).
    #[serde(default)]
    pub description: String,
    /// Priority: high, medium (default) or low.
    #[serde(default = "default_priority")]
    pub priority: String,
    /// Due date, free form.
    #[serde(default)]
    pub due_date: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

/// Input for listing tasks.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTasksInput {
    /// Filter: all (default), pending or completed.
    #[serde(default = "default_status")]
    pub status: String,
    /// Maximum number of tasks to show (default 20).
    pub limit: Option<usize>,
}

fn default_status() -> String {
    "all".to_string()
}

/// Input for completing a task.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompleteTaskInput {
    /// Task ID.
    pub task_id: u64,
}

/// Input for deleting a task.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteTaskInput {
    /// Task ID.
    pub task_id: u64,
    /// Must be true to actually delete.
    #[serde(default)]
    pub confirm: bool,
}

/// Input for creating a note.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateNoteInput {
    /// Note title (1-200 characters).
    pub title: String,
    /// Note content (1-5000 characters).
    pub content: String,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
}

/// Input for listing notes.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListNotesInput {
    /// Maximum number of notes to show (default 10).
    pub limit: Option<usize>,
}

/// Input for searching tasks.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchTasksInput {
    /// Text to look for in titles and descriptions.
    pub query: String,
}

/// Input naming a single file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FilePathInput {
    /// Path of the file.
    pub filepath: String,
}

/// Input for writing a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileInput {
    /// Path of the file.
    pub filepath: String,
    /// Text to write.
    pub content: String,
    /// Replace the file if it exists.
    #[serde(default)]
    pub overwrite: bool,
}

/// Input for listing a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDirectoryInput {
    /// Directory to list (default ".").
    #[serde(default = "default_dir")]
    pub dir_path: String,
    /// Include subdirectories.
    #[serde(default)]
    pub recursive: bool,
}

fn default_dir() -> String {
    ".".to_string()
}

/// Input for searching files by name.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchFilesInput {
    /// Wildcard pattern matched against file names, e.g. `*.md`.
    pub pattern: String,
    /// Directory to search (default ".").
    #[serde(default = "default_dir")]
    pub dir_path: String,
    /// Maximum number of results (default 50).
    pub max_results: Option<usize>,
}

/// Input for deleting a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteFileInput {
    /// Path of the file.
    pub filepath: String,
    /// Must be true to actually delete.
    #[serde(default)]
    pub confirm: bool,
}

/// Input for creating a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDirectoryInput {
    /// Directory to create.
    pub dir_path: String,
}

/// Input for listing connections.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListConnectionsInput {
    /// Filter: all (default), active, idle or disconnected.
    #[serde(default = "default_status")]
    pub status: String,
}

/// Input for looking up one client.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConnectionDetailsInput {
    /// Client identifier.
    pub client_id: String,
}

/// MCP server for the personal assistant.
#[derive(Clone)]
pub struct AssistantServer {
    store: Arc<JsonTaskStore>,
    monitor: Arc<ConnectionMonitor>,
    fs: Arc<FileSystem>,
    client_id: String,
}

impl AssistantServer {
    /// Create a server from its collaborators. Activity is recorded under
    /// `client_id`.
    #[must_use]
    pub fn new(
        store: Arc<JsonTaskStore>,
        monitor: Arc<ConnectionMonitor>,
        fs: Arc<FileSystem>,
        client_id: impl Into<String>,
    ) -> Self {
        Self { store, monitor, fs, client_id: client_id.into() }
    }

    /// Build the store, monitor and filesystem service from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if a data file cannot be initialized.
    pub fn from_settings(settings: &Settings) -> crate::error::Result<Self> {
        let store = JsonTaskStore::new(&settings.tasks_db_path)?;
        let monitor = ConnectionMonitor::new(&settings.connections_path)?;
        let fs = FileSystem::new(&settings.allowed_directories, settings.max_file_size);
        Ok(Self::new(Arc::new(store), Arc::new(monitor), Arc::new(fs), &settings.client_id))
    }

    /// The connection monitor activity is recorded on.
    #[must_use]
    pub fn monitor(&self) -> &Arc<ConnectionMonitor> {
        &self.monitor
    }

    /// Run one tool call.
    ///
    /// Activity is recorded before `run` executes; a failure to record it is
    /// logged and does not stop the call.
    fn dispatch(
        &self,
        tool: Tool,
        args: &impl Debug,
        run: impl FnOnce() -> crate::error::Result<String>,
    ) -> CallToolResult {
        if let Err(e) = self.monitor.record_activity(&self.client_id, Some(tool.name())) {
            tracing::warn!(tool = tool.name(), error = %e, "failed to record activity");
        }
        tracing::debug!(tool = tool.name(), client = %self.client_id, ?args, "tool called");

        let mut guard = ToolCallGuard::new(tool.name());
        match run() {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                guard.mark_error();
                tracing::error!(tool = tool.name(), error = %e, "tool error");
                CallToolResult::error(vec![Content::text(messages::failure(tool, &e))])
            }
        }
    }
}

#[tool(tool_box)]
impl AssistantServer {
    // Tasks

    /// Create a task.
    #[tool(description = "Create a new task with a title, description, priority and due date")]
    fn create_task(
        &self,
        #[tool(aggr)] input: CreateTaskInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::CreateTask, &input, || {
            let task = self.store.create_task(
                &input.title,
                &input.description,
                &input.priority,
                &input.due_date,
            )?;
            Ok(messages::task_created(&task))
        }))
    }

    /// List tasks.
    #[tool(description = "List tasks filtered by status (all, pending, completed)")]
    fn list_tasks(
        &self,
        #[tool(aggr)] input: ListTasksInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::ListTasks, &input, || {
            let status = StatusFilter::parse_or_default(&input.status);
            let page = self.store.list_tasks(status, input.limit.unwrap_or(DEFAULT_TASK_LIMIT))?;
            messages::task_list(&page)
        }))
    }

    /// Complete a task.
    #[tool(description = "Mark a task as completed")]
    fn complete_task(
        &self,
        #[tool(aggr)] input: CompleteTaskInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::CompleteTask, &input, || {
            messages::task_completion(input.task_id, self.store.complete_task(input.task_id))
        }))
    }

    /// Delete a task.
    #[tool(description = "Delete a task permanently (requires confirm=true)")]
    fn delete_task(
        &self,
        #[tool(aggr)] input: DeleteTaskInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::DeleteTask, &input, || {
            messages::task_deletion(
                input.task_id,
                self.store.delete_task(input.task_id, input.confirm),
            )
        }))
    }

    /// Create a note.
    #[tool(description = "Create a note with a title, content and comma-separated tags")]
    fn create_note(
        &self,
        #[tool(aggr)] input: CreateNoteInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::CreateNote, &input, || {
            let note = self.store.create_note(&input.title, &input.content, &input.tags)?;
            Ok(messages::note_created(&note))
        }))
    }

    /// List notes.
    #[tool(description = "List the most recent notes")]
    fn list_notes(
        &self,
        #[tool(aggr)] input: ListNotesInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::ListNotes, &input, || {
            let page = self.store.list_notes(input.limit.unwrap_or(DEFAULT_NOTE_LIMIT))?;
            messages::note_list(&page)
        }))
    }

    /// Search tasks.
    #[tool(description = "Search tasks by text in the title or description")]
    fn search_tasks(
        &self,
        #[tool(aggr)] input: SearchTasksInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::SearchTasks, &input, || {
            let tasks = self.store.search_tasks(&input.query)?;
            messages::task_search(&input.query, &tasks)
        }))
    }

    // Filesystem

    /// Read a file.
    #[tool(description = "Read a text file inside the allowed directories")]
    fn read_file(
        &self,
        #[tool(aggr)] input: FilePathInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::ReadFile, &input, || self.fs.read_file(&input.filepath)))
    }

    /// Write a file.
    #[tool(description = "Write a text file inside the allowed directories")]
    fn write_file(
        &self,
        #[tool(aggr)] input: WriteFileInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::WriteFile, &input.filepath, || {
            let chars = self.fs.write_file(&input.filepath, &input.content, input.overwrite)?;
            Ok(messages::file_written(&input.filepath, chars))
        }))
    }

    /// List a directory.
    #[tool(description = "List the contents of a directory")]
    fn list_directory(
        &self,
        #[tool(aggr)] input: ListDirectoryInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::ListDirectory, &input, || {
            let listing = self.fs.list_directory(&input.dir_path, input.recursive)?;
            messages::directory_listing(&listing)
        }))
    }

    /// Search files by name.
    #[tool(description = "Find files whose names match a wildcard pattern such as *.txt")]
    fn search_files(
        &self,
        #[tool(aggr)] input: SearchFilesInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::SearchFiles, &input, || {
            let max = input.max_results.unwrap_or(DEFAULT_SEARCH_RESULTS);
            let found = self.fs.search_files(&input.pattern, &input.dir_path, max)?;
            messages::file_search(&input.pattern, &found)
        }))
    }

    /// Describe a file.
    #[tool(description = "Show size, timestamps and permissions of a file or directory")]
    fn file_info(
        &self,
        #[tool(aggr)] input: FilePathInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::FileInfo, &input, || {
            messages::file_info(&self.fs.file_info(&input.filepath)?)
        }))
    }

    /// Delete a file.
    #[tool(description = "Delete a file permanently (requires confirm=true)")]
    fn delete_file(
        &self,
        #[tool(aggr)] input: DeleteFileInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::DeleteFile, &input, || {
            let deleted = self.fs.delete_file(&input.filepath, input.confirm)?;
            Ok(messages::file_deletion(&input.filepath, deleted))
        }))
    }

    /// Create a directory.
    #[tool(description = "Create a directory inside the allowed directories")]
    fn create_directory(
        &self,
        #[tool(aggr)] input: CreateDirectoryInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::CreateDirectory, &input, || {
            self.fs.create_directory(&input.dir_path)?;
            Ok(messages::directory_created(&input.dir_path))
        }))
    }

    // Connections

    /// List tracked clients.
    #[tool(description = "List MCP clients by status (all, active, idle, disconnected)")]
    fn list_connections(
        &self,
        #[tool(aggr)] input: ListConnectionsInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::ListConnections, &input, || {
            let status = input.status.trim().to_lowercase();
            let clients = if status == "all" {
                self.monitor.all_clients()?
            } else if let Some(status) = ClientStatus::parse(&status) {
                self.monitor.clients_with_status(Some(status))?
            } else {
                Vec::new()
            };
            messages::connection_list(&status, &clients)
        }))
    }

    /// Connection statistics.
    #[tool(description = "Show counts of tracked clients and total requests")]
    fn get_connection_stats(&self) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::GetConnectionStats, &(), || {
            messages::connection_stats(&self.monitor.stats()?)
        }))
    }

    /// Details of one client.
    #[tool(description = "Show details of one MCP client")]
    fn get_connection_details(
        &self,
        #[tool(aggr)] input: ConnectionDetailsInput,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(self.dispatch(Tool::GetConnectionDetails, &input, || {
            let client = self.monitor.client(&input.client_id)?;
            messages::connection_details(&input.client_id, client.as_ref())
        }))
    }
}

#[rmcp::tool(tool_box)]
impl rmcp::ServerHandler for AssistantServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "personal-assistant".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}
