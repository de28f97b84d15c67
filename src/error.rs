//! Error types for `personal_mcp`.

use crate::validation::ValidationError;
use std::path::PathBuf;

/// Errors that can occur in the assistant server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No task with the given id exists.
    #[error("task #{0} not found")]
    TaskNotFound(u64),

    /// Filesystem tools are not enabled (no allowed directories configured).
    #[error("filesystem access is not configured")]
    FilesystemDisabled,

    /// A path lies outside every allowed directory.
    #[error("access denied: {}", .0.display())]
    AccessDenied(PathBuf),

    /// A file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The path exists but is not a regular file.
    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// The path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The path already exists.
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A file is larger than the configured limit.
    #[error("file too large: {} ({size} bytes, limit {limit})", .path.display())]
    FileTooLarge {
        /// The offending file.
        path: PathBuf,
        /// Its size in bytes.
        size: u64,
        /// The configured limit in bytes.
        limit: u64,
    },

    /// A file is not valid UTF-8 text.
    #[error("file is not UTF-8 text: {}", .0.display())]
    NotUtf8(PathBuf),

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
