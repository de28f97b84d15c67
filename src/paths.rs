//! Path utilities for locating configuration files.
//!
//! Settings are looked up in three places, first match wins:
//! the file named by `$PERSONAL_MCP_CONFIG`, `./config/personal-mcp.yaml`
//! next to the working directory, then the per-user config directory
//! (`~/.config/personal-mcp/config.yaml` on Linux).

use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PERSONAL_MCP_CONFIG";

/// Config file path relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = "config/personal-mcp.yaml";

/// Directory name under the platform config directory.
const APP_DIR_NAME: &str = "personal-mcp";

/// Config filename inside the per-user directory.
const USER_CONFIG_FILENAME: &str = "config.yaml";

/// Get the per-user config file path.
///
/// Returns `None` if the platform config directory cannot be determined.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(USER_CONFIG_FILENAME))
}

/// Candidate config files in lookup order.
///
/// `explicit` is the value of [`CONFIG_ENV`], if set. Relative candidates are
/// resolved against `base_dir`.
#[must_use]
pub fn config_candidates(explicit: Option<&str>, base_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        candidates.push(base_dir.join(path));
    }
    candidates.push(base_dir.join(LOCAL_CONFIG_PATH));
    if let Some(path) = user_config_path() {
        candidates.push(path);
    }
    candidates
}
