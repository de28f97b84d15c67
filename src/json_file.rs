//! A JSON document on disk guarded by an advisory lock.
//!
//! Every access re-reads the file while holding a lock on a `<file>.lock`
//! sibling: shared for reads, exclusive for updates. Writes go to a temporary
//! sibling that is synced and renamed over the target, so readers never see a
//! partial document. Separate processes pointed at the same file therefore
//! always observe each other's changes.

use crate::error::Result;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// How an unreadable document is handled when loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// Leave the file alone and use the default document.
    Ignore,
    /// Move the file to `<file>.corrupt` before it gets replaced.
    Quarantine,
}

/// Outcome of [`JsonFile::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// The file existed and parsed.
    Loaded,
    /// The file did not exist and an empty document was written.
    Created,
    /// The file could not be parsed; it was moved aside and replaced.
    Recovered,
}

/// A JSON file holding one document of type `T`.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFile {
    /// Create a handle for the document at `path`. Nothing is touched on disk.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let lock_path = sibling(&path, "lock");
        Self { path, lock_path }
    }

    /// Path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the document exists and parses, creating or replacing it with
    /// `T::default()` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, lock, or file cannot be written.
    pub fn initialize<T>(&self) -> Result<InitState>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let _lock = self.lock(true)?;
        if !self.path.exists() {
            self.write_atomic(&T::default())?;
            return Ok(InitState::Created);
        }
        match self.parse::<T>() {
            Ok(_) => Ok(InitState::Loaded),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "unreadable document, starting empty");
                self.quarantine();
                self.write_atomic(&T::default())?;
                Ok(InitState::Recovered)
            }
        }
    }

    /// Read the current document under a shared lock.
    ///
    /// A missing or unreadable file yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    pub fn read<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let _lock = self.lock(false)?;
        Ok(self.load(Recovery::Ignore))
    }

    /// Read, modify and write back the document under an exclusive lock.
    ///
    /// If `apply` fails nothing is written and its error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error from `apply`, or an I/O/serialization error from
    /// writing the document.
    pub fn update<T, R>(&self, apply: impl FnOnce(&mut T) -> Result<R>) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let _lock = self.lock(true)?;
        let mut doc = self.load(Recovery::Quarantine);
        let out = apply(&mut doc)?;
        self.write_atomic(&doc)?;
        Ok(out)
    }

    fn lock(&self, exclusive: bool) -> Result<File> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file =
            OpenOptions::new().create(true).truncate(false).write(true).open(&self.lock_path)?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        // Released when the handle is dropped.
        Ok(file)
    }

    fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn load<T: DeserializeOwned + Default>(&self, recovery: Recovery) -> T {
        if !self.path.exists() {
            return T::default();
        }
        match self.parse() {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to load document");
                if recovery == Recovery::Quarantine {
                    self.quarantine();
                }
                T::default()
            }
        }
    }

    fn quarantine(&self) {
        let target = self.quarantine_target();
        match fs::rename(&self.path, &target) {
            Ok(()) => tracing::warn!(path = %target.display(), "unreadable document moved aside"),
            Err(e) => tracing::warn!(error = %e, "could not move unreadable document aside"),
        }
    }

    /// `<file>.corrupt`, or a timestamped variant when an earlier copy is kept there.
    fn quarantine_target(&self) -> PathBuf {
        let first = sibling(&self.path, "corrupt");
        if !first.exists() {
            return first;
        }
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        (0u32..)
            .map(|n| match n {
                0 => sibling(&self.path, &format!("corrupt.{stamp}")),
                n => sibling(&self.path, &format!("corrupt.{stamp}.{n}")),
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    fn write_atomic<T: Serialize>(&self, doc: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        let temp_path = sibling(&self.path, "tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// `<path>.<suffix>`, keeping the original extension.
pub(crate) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
