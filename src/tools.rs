//! The closed set of tools the assistant exposes.

/// Functional group a tool belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolGroup {
    /// Task and note management.
    Tasks,
    /// Sandboxed file access.
    Filesystem,
    /// Client connection reporting.
    Connections,
}

impl ToolGroup {
    /// All groups in registration order.
    pub const ALL: [Self; 3] = [Self::Tasks, Self::Filesystem, Self::Connections];

    /// Get the string representation of the group.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Filesystem => "filesystem",
            Self::Connections => "connections",
        }
    }
}

/// Every tool the MCP server registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Create a task.
    CreateTask,
    /// List tasks.
    ListTasks,
    /// Complete a task.
    CompleteTask,
    /// Delete a task.
    DeleteTask,
    /// Create a note.
    CreateNote,
    /// List notes.
    ListNotes,
    /// Search tasks.
    SearchTasks,
    /// Read a file.
    ReadFile,
    /// Write a file.
    WriteFile,
    /// List a directory.
    ListDirectory,
    /// Search for files by name.
    SearchFiles,
    /// Describe a file.
    FileInfo,
    /// Delete a file.
    DeleteFile,
    /// Create a directory.
    CreateDirectory,
    /// List tracked clients.
    ListConnections,
    /// Connection statistics.
    GetConnectionStats,
    /// Details of one client.
    GetConnectionDetails,
}

impl Tool {
    /// All tools in registration order.
    pub const ALL: [Self; 17] = [
        Self::CreateTask,
        Self::ListTasks,
        Self::CompleteTask,
        Self::DeleteTask,
        Self::CreateNote,
        Self::ListNotes,
        Self::SearchTasks,
        Self::ReadFile,
        Self::WriteFile,
        Self::ListDirectory,
        Self::SearchFiles,
        Self::FileInfo,
        Self::DeleteFile,
        Self::CreateDirectory,
        Self::ListConnections,
        Self::GetConnectionStats,
        Self::GetConnectionDetails,
    ];

    /// Wire name used by the protocol.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateTask => "create_task",
            Self::ListTasks => "list_tasks",
            Self::CompleteTask => "complete_task",
            Self::DeleteTask => "delete_task",
            Self::CreateNote => "create_note",
            Self::ListNotes => "list_notes",
            Self::SearchTasks => "search_tasks",
            Self::ReadFile => "read_file",
            Self::WriteFile => "write_file",
            Self::ListDirectory => "list_directory",
            Self::SearchFiles => "search_files",
            Self::FileInfo => "file_info",
            Self::DeleteFile => "delete_file",
            Self::CreateDirectory => "create_directory",
            Self::ListConnections => "list_connections",
            Self::GetConnectionStats => "get_connection_stats",
            Self::GetConnectionDetails => "get_connection_details",
        }
    }

    /// Group the tool belongs to.
    #[must_use]
    pub const fn group(self) -> ToolGroup {
        match self {
            Self::CreateTask
            | Self::ListTasks
            | Self::CompleteTask
            | Self::DeleteTask
            | Self::CreateNote
            | Self::ListNotes
            | Self::SearchTasks => ToolGroup::Tasks,
            Self::ReadFile
            | Self::WriteFile
            | Self::ListDirectory
            | Self::SearchFiles
            | Self::FileInfo
            | Self::DeleteFile
            | Self::CreateDirectory => ToolGroup::Filesystem,
            Self::ListConnections | Self::GetConnectionStats | Self::GetConnectionDetails => {
                ToolGroup::Connections
            }
        }
    }

    /// Gerund used in failure messages, e.g. "Error creating task: ...".
    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::CreateTask => "creating task",
            Self::ListTasks => "listing tasks",
            Self::CompleteTask => "completing task",
            Self::DeleteTask => "deleting task",
            Self::CreateNote => "creating note",
            Self::ListNotes => "listing notes",
            Self::SearchTasks => "searching tasks",
            Self::ReadFile => "reading file",
            Self::WriteFile => "writing file",
            Self::ListDirectory => "listing directory",
            Self::SearchFiles => "searching files",
            Self::FileInfo => "getting file info",
            Self::DeleteFile => "deleting file",
            Self::CreateDirectory => "creating directory",
            Self::ListConnections => "listing connections",
            Self::GetConnectionStats => "getting connection stats",
            Self::GetConnectionDetails => "getting connection details",
        }
    }

    /// Tools belonging to `group`.
    pub fn in_group(group: ToolGroup) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |tool| tool.group() == group)
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
