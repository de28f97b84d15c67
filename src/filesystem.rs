//! File access restricted to configured directories.
//!
//! Every path goes through [`validate_path`] and must land inside one of the
//! allowed directories after resolution. Relative paths are taken relative to
//! the first allowed directory.

use crate::error::{Error, Result};
use crate::validation::{is_path_allowed, validate_filename, validate_path, ValidationError};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Maximum entries returned by a directory listing.
pub const LISTING_CAP: usize = 100;
/// Default cap on search results.
pub const DEFAULT_SEARCH_RESULTS: usize = 50;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything else (sockets, devices, dangling links).
    Other,
}

impl EntryKind {
    fn of(meta: &fs::Metadata) -> Self {
        if meta.is_file() {
            Self::File
        } else if meta.is_dir() {
            Self::Directory
        } else {
            Self::Other
        }
    }
}

/// One entry of a listing or search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Path relative to the listed directory.
    pub path: String,
    /// Entry kind.
    pub kind: EntryKind,
    /// Size in bytes, for files.
    pub size: Option<u64>,
}

/// Result of [`FileSystem::list_directory`] or [`FileSystem::search_files`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// Directory as given by the caller.
    pub dir: String,
    /// Entries shown, sorted by path.
    pub entries: Vec<Entry>,
    /// Entries found in total, including those cut off.
    pub total: usize,
}

impl Listing {
    /// Entries found but not shown.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.total.saturating_sub(self.entries.len())
    }
}

/// Metadata about a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDetails {
    /// Path as given by the caller.
    pub path: String,
    /// Entry kind.
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Last modification, local time.
    pub modified: Option<String>,
    /// Creation time where the platform records it.
    pub created: Option<String>,
    /// Permission bits in octal, or `readonly`/`readwrite` off Unix.
    pub permissions: String,
    /// Human-readable file type guessed from the extension, for files.
    pub file_type: Option<&'static str>,
}

/// Sandboxed file operations.
#[derive(Debug, Clone)]
pub struct FileSystem {
    allowed_dirs: Vec<PathBuf>,
    max_file_size: u64,
}

impl FileSystem {
    /// Create the service. Allowed directories that do not exist are dropped.
    #[must_use]
    pub fn new(allowed_dirs: &[PathBuf], max_file_size: u64) -> Self {
        let allowed_dirs: Vec<PathBuf> = allowed_dirs
            .iter()
            .filter_map(|dir| match dir.canonicalize() {
                Ok(resolved) if resolved.is_dir() => {
                    tracing::info!(dir = %resolved.display(), "allowed directory");
                    Some(resolved)
                }
                _ => {
                    tracing::warn!(dir = %dir.display(), "allowed directory does not exist, ignoring");
                    None
                }
            })
            .collect();
        Self { allowed_dirs, max_file_size }
    }

    /// Whether any directory is accessible.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.allowed_dirs.is_empty()
    }

    /// The resolved allowed directories.
    #[must_use]
    pub fn allowed_dirs(&self) -> &[PathBuf] {
        &self.allowed_dirs
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let base = self.allowed_dirs.first().ok_or(Error::FilesystemDisabled)?;
        let resolved = validate_path(path, base)?;
        if !is_path_allowed(&resolved, &self.allowed_dirs) {
            tracing::warn!(path, "access outside allowed directories denied");
            return Err(Error::AccessDenied(resolved));
        }
        Ok(resolved)
    }

    fn existing_dir(&self, dir_path: &str) -> Result<PathBuf> {
        let path = self.resolve(dir_path)?;
        if !path.exists() {
            return Err(Error::FileNotFound(path));
        }
        if !path.is_dir() {
            return Err(Error::NotADirectory(path));
        }
        Ok(path)
    }

    /// Read a UTF-8 text file.
    ///
    /// # Errors
    ///
    /// Fails if the path is not allowed, missing, not a file, larger than the
    /// configured limit, or not UTF-8.
    pub fn read_file(&self, filepath: &str) -> Result<String> {
        let path = self.resolve(filepath)?;
        if !path.exists() {
            return Err(Error::FileNotFound(path));
        }
        let meta = fs::metadata(&path)?;
        if !meta.is_file() {
            return Err(Error::NotAFile(path));
        }
        if meta.len() > self.max_file_size {
            return Err(Error::FileTooLarge { path, size: meta.len(), limit: self.max_file_size });
        }
        let bytes = fs::read(&path)?;
        let content = String::from_utf8(bytes).map_err(|_| Error::NotUtf8(path.clone()))?;
        tracing::info!(path = %path.display(), "file read");
        Ok(content)
    }

    /// Write `content` to a file, creating parent directories.
    ///
    /// Returns the number of characters written.
    ///
    /// # Errors
    ///
    /// Fails if the path is not allowed, the file name is invalid, or the file
    /// exists and `overwrite` is false.
    pub fn write_file(&self, filepath: &str, content: &str, overwrite: bool) -> Result<usize> {
        let path = self.resolve(filepath)?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        validate_filename(&name)?;
        if path.exists() && !overwrite {
            return Err(Error::AlreadyExists(path));
        }
        if path.is_dir() {
            return Err(Error::NotAFile(path));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        tracing::info!(path = %path.display(), "file written");
        Ok(content.chars().count())
    }

    /// List a directory, optionally recursively.
    ///
    /// # Errors
    ///
    /// Fails if the path is not allowed or is not an existing directory.
    pub fn list_directory(&self, dir_path: &str, recursive: bool) -> Result<Listing> {
        let root = self.existing_dir(dir_path)?;
        let depth = if recursive { usize::MAX } else { 1 };
        let entries = walk(&root, depth, |_| true);
        Ok(truncate(dir_path, entries, LISTING_CAP))
    }

    /// Recursively find entries whose name matches a wildcard `pattern`.
    ///
    /// # Errors
    ///
    /// Fails if the path is not allowed, is not an existing directory, or the
    /// pattern is invalid.
    pub fn search_files(&self, pattern: &str, dir_path: &str, max_results: usize) -> Result<Listing> {
        let root = self.existing_dir(dir_path)?;
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| ValidationError::InvalidPattern(format!("{pattern}: {e}")))?;
        let entries = walk(&root, usize::MAX, |name| matcher.matches(name));
        Ok(truncate(dir_path, entries, max_results))
    }

    /// Describe a file or directory.
    ///
    /// # Errors
    ///
    /// Fails if the path is not allowed or does not exist.
    pub fn file_info(&self, filepath: &str) -> Result<FileDetails> {
        let path = self.resolve(filepath)?;
        if !path.exists() {
            return Err(Error::FileNotFound(path));
        }
        let meta = fs::metadata(&path)?;
        let kind = EntryKind::of(&meta);
        Ok(FileDetails {
            path: filepath.to_string(),
            kind,
            size: meta.len(),
            modified: meta.modified().ok().map(format_time),
            created: meta.created().ok().map(format_time),
            permissions: permissions(&meta),
            file_type: (kind == EntryKind::File).then(|| file_type_label(&path)),
        })
    }

    /// Delete a regular file. Without `confirm` nothing is touched.
    ///
    /// Returns whether the file was deleted.
    ///
    /// # Errors
    ///
    /// Fails if the path is not allowed, missing, or a directory.
    pub fn delete_file(&self, filepath: &str, confirm: bool) -> Result<bool> {
        if !confirm {
            return Ok(false);
        }
        let path = self.resolve(filepath)?;
        if !path.exists() {
            return Err(Error::FileNotFound(path));
        }
        if !path.is_file() {
            return Err(Error::NotAFile(path));
        }
        fs::remove_file(&path)?;
        tracing::warn!(path = %path.display(), "file deleted");
        Ok(true)
    }

    /// Create a directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Fails if the path is not allowed or already exists.
    pub fn create_directory(&self, dir_path: &str) -> Result<PathBuf> {
        let path = self.resolve(dir_path)?;
        if path.exists() {
            return Err(Error::AlreadyExists(path));
        }
        fs::create_dir_all(&path)?;
        tracing::info!(path = %path.display(), "directory created");
        Ok(path)
    }
}

fn walk(root: &Path, max_depth: usize, keep: impl Fn(&str) -> bool) -> Vec<Entry> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| keep(&entry.file_name().to_string_lossy()))
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            let kind = EntryKind::of(&meta);
            let rel = entry.path().strip_prefix(root).ok()?;
            Some(Entry {
                path: rel.to_string_lossy().into_owned(),
                kind,
                size: (kind == EntryKind::File).then(|| meta.len()),
            })
        })
        .collect()
}

fn truncate(dir: &str, mut entries: Vec<Entry>, cap: usize) -> Listing {
    let total = entries.len();
    entries.truncate(cap);
    Listing { dir: dir.to_string(), entries, total }
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(unix)]
fn permissions(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions(meta: &fs::Metadata) -> String {
    if meta.permissions().readonly() { "readonly" } else { "readwrite" }.to_string()
}

fn file_type_label(path: &Path) -> &'static str {
    let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "txt" => "Text",
        "md" => "Markdown",
        "py" => "Python",
        "rs" => "Rust",
        "js" => "JavaScript",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "csv" => "CSV",
        "pdf" => "PDF",
        _ => "Unknown",
    }
}
