//! Configuration for the assistant servers.
//!
//! Settings come from a YAML file (see [`crate::paths`] for the lookup order),
//! then `PERSONAL_MCP_*` environment variables override individual fields.
//! Every field has a default, so running without any configuration works.

use crate::error::{Error, Result};
use crate::paths::{config_candidates, CONFIG_ENV};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default upper bound for files read through the filesystem tools (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL"];

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Address the REST facade binds to.
    pub host: String,
    /// Port the REST facade binds to.
    pub port: u16,
    /// Mirror errors to stderr and log at debug level.
    pub debug: bool,

    /// Task and note store.
    pub tasks_db_path: PathBuf,
    /// Connection monitor document.
    pub connections_path: PathBuf,

    /// Directories the filesystem tools may touch. Empty disables them.
    pub allowed_directories: Vec<PathBuf>,
    /// Largest file `read_file` will return, in bytes.
    pub max_file_size: u64,

    /// One of TRACE, DEBUG, INFO, WARNING, ERROR, CRITICAL.
    pub log_level: String,
    /// Log file of the MCP server.
    pub log_file: PathBuf,
    /// Log file of the REST facade.
    pub api_log_file: PathBuf,

    /// Identifier the MCP server records activity under.
    pub client_id: String,
    /// Display name for that client.
    pub client_name: String,

    /// Static front-end assets served by the REST facade, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
    /// Template overrides, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,

    /// Unrecognized log level replaced by INFO while loading.
    #[serde(skip)]
    pub rejected_log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            debug: false,
            tasks_db_path: PathBuf::from("./data/tasks.json"),
            connections_path: PathBuf::from("./data/mcp_connections.json"),
            allowed_directories: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            log_level: "INFO".to_string(),
            log_file: PathBuf::from("./logs/mcp_server.log"),
            api_log_file: PathBuf::from("./logs/api_server.log"),
            client_id: "claude-desktop".to_string(),
            client_name: "Claude Desktop".to_string(),
            static_dir: None,
            templates_dir: None,
            rejected_log_level: None,
        }
    }
}

impl Settings {
    /// Load settings from the first config file found and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or an
    /// environment override has an invalid value.
    pub fn load() -> Result<Self> {
        let base_dir = std::env::current_dir()?;
        Self::load_with(|key| std::env::var(key).ok(), &base_dir)
    }

    /// Load settings using `lookup` for environment variables and resolving
    /// relative config locations against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or an
    /// override has an invalid value.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>, base_dir: &Path) -> Result<Self> {
        let explicit = lookup(CONFIG_ENV);
        let mut settings = config_candidates(explicit.as_deref(), base_dir)
            .into_iter()
            .find(|path| path.is_file())
            .map_or_else(|| Ok(Self::default()), |path| Self::load_from(&path))?;
        settings.apply_env(lookup)?;
        settings.normalize();
        Ok(settings)
    }

    /// Load settings from a specific YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_yaml::from_str(&content)?;
        settings.normalize();
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Load a specific YAML file, then apply the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// environment override has an invalid value.
    pub fn load_file(path: &Path) -> Result<Self> {
        Self::load_file_with(path, |key| std::env::var(key).ok())
    }

    /// Load a specific YAML file, then apply overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override
    /// has an invalid value.
    pub fn load_file_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::load_from(path)?;
        settings.apply_env(lookup)?;
        settings.normalize();
        Ok(settings)
    }

    /// Save settings to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `PERSONAL_MCP_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean override cannot be parsed.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("PERSONAL_MCP_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PERSONAL_MCP_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid PERSONAL_MCP_PORT: {port}")))?;
        }
        if let Some(debug) = lookup("PERSONAL_MCP_DEBUG") {
            self.debug = parse_bool(&debug)
                .ok_or_else(|| Error::Config(format!("invalid PERSONAL_MCP_DEBUG: {debug}")))?;
        }
        if let Some(path) = lookup("PERSONAL_MCP_TASKS_DB_PATH") {
            self.tasks_db_path = PathBuf::from(path);
        }
        if let Some(dirs) = lookup("PERSONAL_MCP_ALLOWED_DIRECTORIES") {
            self.allowed_directories = parse_directory_list(&dirs);
        }
        if let Some(level) = lookup("PERSONAL_MCP_LOG_LEVEL") {
            self.log_level = level;
            self.rejected_log_level = None;
        }
        if let Some(path) = lookup("PERSONAL_MCP_LOG_FILE") {
            self.log_file = PathBuf::from(path);
        }
        Ok(())
    }

    /// Canonicalize the log level, falling back to INFO for unknown values.
    fn normalize(&mut self) {
        let level = self.log_level.trim().to_uppercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            self.log_level = level;
        } else {
            let rejected = std::mem::replace(&mut self.log_level, "INFO".to_string());
            self.rejected_log_level = Some(rejected);
        }
    }

    /// Report problems found while loading. Logging must be initialized first.
    pub fn log_load_warnings(&self) {
        if let Some(level) = &self.rejected_log_level {
            tracing::warn!(level = %level, "invalid log level, using INFO");
        }
    }

    /// The configured log level as a `tracing` level.
    #[must_use]
    pub fn level(&self) -> tracing::Level {
        match self.log_level.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "WARNING" | "WARN" => tracing::Level::WARN,
            "ERROR" | "CRITICAL" => tracing::Level::ERROR,
            _ if self.debug => tracing::Level::DEBUG,
            _ => tracing::Level::INFO,
        }
    }

    /// Create the directories holding the data and log files.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        for file in [&self.tasks_db_path, &self.connections_path, &self.log_file, &self.api_log_file]
        {
            if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated directory list, dropping quotes and blanks.
fn parse_directory_list(value: &str) -> Vec<PathBuf> {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.tasks_db_path, PathBuf::from("./data/tasks.json"));
        assert_eq!(settings.max_file_size, 10_485_760);
        assert!(settings.allowed_directories.is_empty());
        assert_eq!(settings.level(), tracing::Level::INFO);
    }

    #[test]
    fn test_load_without_any_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_with(env(&[]), dir.path()).unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.client_id, "claude-desktop");
    }

    #[test]
    fn test_load_local_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(crate::paths::LOCAL_CONFIG_PATH);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "port: 8080\nallowed_directories:\n  - /srv/docs\n").unwrap();

        let settings = Settings::load_with(env(&[]), dir.path()).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.allowed_directories, vec![PathBuf::from("/srv/docs")]);
        // Unset fields keep their defaults.
        assert_eq!(settings.log_file, PathBuf::from("./logs/mcp_server.log"));
    }

    #[test]
    fn test_explicit_config_file_wins() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join(crate::paths::LOCAL_CONFIG_PATH);
        std::fs::create_dir_all(local.parent().unwrap()).unwrap();
        std::fs::write(&local, "port: 1111\n").unwrap();
        std::fs::write(dir.path().join("other.yaml"), "port: 2222\n").unwrap();

        let settings =
            Settings::load_with(env(&[("PERSONAL_MCP_CONFIG", "other.yaml")]), dir.path())
                .unwrap();
        assert_eq!(settings.port, 2222);
    }

    #[test]
    fn test_env_overrides() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_with(
            env(&[
                ("PERSONAL_MCP_HOST", "0.0.0.0"),
                ("PERSONAL_MCP_PORT", "9000"),
                ("PERSONAL_MCP_DEBUG", "true"),
                ("PERSONAL_MCP_TASKS_DB_PATH", "/tmp/t.json"),
                ("PERSONAL_MCP_ALLOWED_DIRECTORIES", "\"/a, /b ,,\""),
                ("PERSONAL_MCP_LOG_LEVEL", "debug"),
                ("PERSONAL_MCP_LOG_FILE", "/tmp/mcp.log"),
            ]),
            dir.path(),
        )
        .unwrap();
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 9000);
        assert!(settings.debug);
        assert_eq!(settings.tasks_db_path, PathBuf::from("/tmp/t.json"));
        assert_eq!(settings.allowed_directories, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(settings.log_level, "DEBUG");
        assert_eq!(settings.log_file, PathBuf::from("/tmp/mcp.log"));
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load_with(env(&[("PERSONAL_MCP_PORT", "http")]), dir.path());
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_log_level_falls_back_to_info() {
        let dir = TempDir::new().unwrap();
        let settings =
            Settings::load_with(env(&[("PERSONAL_MCP_LOG_LEVEL", "chatty")]), dir.path()).unwrap();
        assert_eq!(settings.log_level, "INFO");
        assert_eq!(settings.rejected_log_level.as_deref(), Some("chatty"));

        let ((), logs) = crate::logging::test_support::capture(|| settings.log_load_warnings());
        assert!(logs.contains("invalid log level"), "{logs}");
        assert!(logs.contains("chatty"), "{logs}");
    }

    #[test]
    fn test_explicit_file_still_takes_env_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "port: 8080\nlog_level: debug\n").unwrap();

        let settings =
            Settings::load_file_with(&path, env(&[("PERSONAL_MCP_PORT", "9090")])).unwrap();
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.log_level, "DEBUG");
        assert!(settings.rejected_log_level.is_none());

        std::fs::write(&path, "log_level: chatty\n").unwrap();
        let settings =
            Settings::load_file_with(&path, env(&[("PERSONAL_MCP_LOG_LEVEL", "warning")])).unwrap();
        assert_eq!(settings.log_level, "WARNING");
        assert!(settings.rejected_log_level.is_none());
    }

    #[test]
    fn test_level_mapping() {
        let mut settings = Settings { log_level: "WARNING".to_string(), ..Settings::default() };
        assert_eq!(settings.level(), tracing::Level::WARN);
        settings.log_level = "CRITICAL".to_string();
        assert_eq!(settings.level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "port: [not a number").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.yaml");
        let settings = Settings {
            port: 7000,
            static_dir: Some(PathBuf::from("./web")),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("port: 7000"));
        assert!(!content.contains("templates_dir"));
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_ensure_directories() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            tasks_db_path: dir.path().join("data/tasks.json"),
            connections_path: dir.path().join("data/conn.json"),
            log_file: dir.path().join("logs/mcp.log"),
            api_log_file: dir.path().join("logs/api.log"),
            ..Settings::default()
        };
        settings.ensure_directories().unwrap();
        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("logs").is_dir());
    }
}
