//! Input validation helpers.
//!
//! String bounds are measured in characters, not bytes. Path helpers reject
//! traversal (`..`) outright and resolve everything else to an absolute path
//! before the allow-list check, so symlinked ancestors cannot escape an
//! allowed directory.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Characters that may never appear in a file name.
const FORBIDDEN_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Device names reserved on Windows, matched case-insensitively.
static RESERVED_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(CON|PRN|AUX|NUL|COM[1-9]|LPT[1-9])$").expect("reserved-name regex is valid")
});

/// A rejected input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The text is shorter than allowed after trimming.
    #[error("{field} is too short (minimum {min} characters)")]
    TooShort {
        /// Name of the offending field.
        field: &'static str,
        /// Minimum length in characters.
        min: usize,
    },

    /// The text is longer than allowed after trimming.
    #[error("{field} is too long (maximum {max} characters)")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    /// The path contains a `..` component.
    #[error("path traversal is not allowed: {0}")]
    PathTraversal(String),

    /// The path is empty.
    #[error("path is empty")]
    EmptyPath,

    /// The file name is empty.
    #[error("file name is empty")]
    EmptyFileName,

    /// The file name contains a forbidden character.
    #[error("forbidden character {0:?} in file name")]
    ForbiddenCharacter(char),

    /// The file name is a reserved device name.
    #[error("reserved system name: {0}")]
    ReservedName(String),

    /// A wildcard pattern could not be parsed.
    #[error("invalid pattern {0}")]
    InvalidPattern(String),
}

/// Trim `text` and check its length lies within `min..=max` characters.
///
/// # Errors
///
/// Returns [`ValidationError::TooShort`] or [`ValidationError::TooLong`].
pub fn validate_string(
    field: &'static str,
    text: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Split a comma-separated tag string into trimmed, non-empty tags.
#[must_use]
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
}

/// Validate a user-supplied path and make it absolute.
///
/// Relative paths are resolved against `base`. The longest existing ancestor
/// is canonicalized and the remaining (non-existent) components appended, so
/// paths that are about to be created still resolve through symlinks.
///
/// # Errors
///
/// Returns [`ValidationError::PathTraversal`] if any component is `..`,
/// including in the target of a dangling symlink.
pub fn validate_path(path: &str, base: &Path) -> Result<PathBuf, ValidationError> {
    if path.trim().is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    let raw = Path::new(path);
    if raw.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ValidationError::PathTraversal(path.to_string()));
    }

    let absolute = if raw.is_absolute() { raw.to_path_buf() } else { base.join(raw) };
    let resolved = resolve_existing_prefix(&absolute, MAX_SYMLINK_HOPS);
    // A link target may itself climb out with `..`.
    if resolved.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ValidationError::PathTraversal(path.to_string()));
    }
    Ok(resolved)
}

/// Links followed by hand before giving up on a chain of dangling symlinks.
const MAX_SYMLINK_HOPS: usize = 40;

/// Canonicalize the longest existing prefix of `path`.
///
/// A dangling symlink is followed to its target, so a write through it is
/// checked against where it would actually land.
fn resolve_existing_prefix(path: &Path, hops: usize) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return append_rest(canonical, &rest);
        }
        let is_link = existing.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink());
        if is_link && hops > 0 {
            if let Ok(target) = fs::read_link(&existing) {
                let target = match existing.parent() {
                    Some(parent) if target.is_relative() => parent.join(target),
                    _ => target,
                };
                return resolve_existing_prefix(&append_rest(target, &rest), hops - 1);
            }
        }
        match (existing.file_name().map(ToOwned::to_owned), existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}

fn append_rest(base: PathBuf, rest: &[OsString]) -> PathBuf {
    rest.iter().rev().fold(base, |acc, part| acc.join(part))
}

/// Check that a file name is usable on every platform.
///
/// # Errors
///
/// Returns an error for empty names, forbidden characters, or reserved
/// device names.
pub fn validate_filename(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyFileName);
    }
    if let Some(ch) = trimmed.chars().find(|c| FORBIDDEN_FILENAME_CHARS.contains(c)) {
        return Err(ValidationError::ForbiddenCharacter(ch));
    }
    if RESERVED_FILENAME.is_match(trimmed) {
        return Err(ValidationError::ReservedName(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Check whether `path` lies inside one of `allowed_dirs`.
///
/// Both sides are expected to be absolute and already resolved.
#[must_use]
pub fn is_path_allowed(path: &Path, allowed_dirs: &[PathBuf]) -> bool {
    allowed_dirs.iter().any(|dir| path.starts_with(dir))
}
