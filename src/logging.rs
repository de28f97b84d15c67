//! Log setup shared by the binaries.
//!
//! Events are written to a log file. The MCP server must never write to
//! stdout, since stdout carries the protocol, so its console output (if any)
//! is limited to errors on stderr. The REST facade also echoes to stdout.

use crate::error::{Error, Result};
use crate::json_file::sibling;
use std::any::Any;
use std::fs::{self, File, OpenOptions};
use std::panic;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Maximum log file size before rotation (10 MiB).
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Where log events go besides the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    /// File only.
    Off,
    /// Errors are mirrored to stderr.
    StderrErrors,
    /// Everything is echoed to stdout.
    Stdout,
}

/// Move `path` to `<path>.old` if it is larger than `max_size`.
///
/// Returns whether the file was rotated.
///
/// # Errors
///
/// Returns an error if the rename fails.
pub fn rotate_if_larger(path: &Path, max_size: u64) -> std::io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > max_size => {
            fs::rename(path, sibling(path, "old"))?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Open the log file for appending, rotating it first if it is too large.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    rotate_if_larger(path, MAX_LOG_SIZE)?;
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a subscriber is
/// already installed.
pub fn init(log_file: &Path, level: Level, console: Console) -> Result<()> {
    let file = open_log_file(log_file)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let file_layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).with_target(true);

    let console_writer = match console {
        Console::Off => None,
        Console::StderrErrors => {
            Some(BoxMakeWriter::new(std::io::stderr.with_max_level(Level::ERROR)))
        }
        Console::Stdout => Some(BoxMakeWriter::new(std::io::stdout)),
    };
    let console_layer = console_writer.map(|w| fmt::layer().with_writer(w).with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install logger: {e}")))?;

    tracing::info!(log_file = %log_file.display(), %level, "logging initialized");
    Ok(())
}

fn panic_payload(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Install a panic hook that logs panics before the default handler runs.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let location = info.location().map_or_else(
            || "unknown".to_string(),
            |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
        );
        let payload = panic_payload(info.payload());
        tracing::error!(%location, %payload, "panic");

        let backtrace = std::backtrace::Backtrace::capture();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            tracing::error!(%backtrace, "panic backtrace");
        }

        original_hook(info);
    }));

    tracing::debug!("panic hook installed");
}

/// A guard that logs tool call duration and outcome when dropped.
///
/// ```ignore
/// let mut guard = ToolCallGuard::new("create_task");
/// if result.is_err() {
///     guard.mark_error();
/// }
/// ```
pub struct ToolCallGuard {
    tool_name: &'static str,
    start: Instant,
    success: bool,
}

impl ToolCallGuard {
    /// Create a new tool call guard and log the start.
    #[must_use]
    pub fn new(tool_name: &'static str) -> Self {
        tracing::info!(tool = tool_name, "tool started");
        Self { tool_name, start: Instant::now(), success: true }
    }

    /// Mark the tool call as failed.
    pub fn mark_error(&mut self) {
        self.success = false;
    }
}

impl Drop for ToolCallGuard {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis();
        if self.success {
            tracing::info!(tool = self.tool_name, duration_ms, "tool finished");
        } else {
            tracing::warn!(tool = self.tool_name, duration_ms, "tool failed");
        }
    }
}
