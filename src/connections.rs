//! Tracking of MCP clients.
//!
//! The monitor persists every known client to its own JSON document so the
//! REST facade and the CLI can report on connections made through the MCP
//! server.

use crate::error::Result;
use crate::json_file::JsonFile;
use crate::time::{now_iso, parse_timestamp};
use chrono::{Duration, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Connection state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    /// Recently active.
    #[default]
    Active,
    /// Connected but silent for a while.
    Idle,
    /// Gone.
    Disconnected,
}

impl ClientStatus {
    /// Parse a status name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "idle" => Some(Self::Idle),
            "disconnected" => Some(Self::Disconnected),
            _ => None,
        }
    }

    /// Get the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Idle => "idle",
            Self::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client that has connected at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Identifier the client registered with.
    pub client_id: String,
    /// Human-readable name.
    pub client_name: String,
    /// ISO 8601 timestamp of first registration.
    pub connected_at: String,
    /// ISO 8601 timestamp of the latest request or state change.
    pub last_activity: String,
    /// Number of tool calls recorded.
    #[serde(default)]
    pub requests_count: u64,
    /// Distinct tools called, in first-use order.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Current state.
    #[serde(default)]
    pub status: ClientStatus,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConnectionsDocument {
    #[serde(default)]
    clients: BTreeMap<String, Client>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Aggregate connection counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStats {
    /// Known clients.
    pub total_clients: usize,
    /// Clients currently active.
    pub active_clients: usize,
    /// Clients currently idle.
    pub idle_clients: usize,
    /// Clients that disconnected.
    pub disconnected_clients: usize,
    /// Sum of all recorded requests.
    pub total_requests: u64,
    /// When these numbers were computed.
    pub timestamp: String,
}

/// Persistent registry of MCP clients.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    file: JsonFile,
}

impl ConnectionMonitor {
    /// Open the monitor backed by the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = JsonFile::new(path);
        file.initialize::<ConnectionsDocument>()?;
        let monitor = Self { file };
        tracing::info!(clients = monitor.all_clients()?.len(), "connection monitor loaded");
        Ok(monitor)
    }

    /// Get the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn load(&self) -> Result<ConnectionsDocument> {
        self.file.read()
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut ConnectionsDocument) -> Result<R>) -> Result<R> {
        self.file.update(|doc: &mut ConnectionsDocument| {
            let out = apply(doc)?;
            doc.last_updated = Some(now_iso());
            Ok(out)
        })
    }

    /// Register a client, or reactivate it if already known.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn register_client(&self, client_id: &str, client_name: &str) -> Result<Client> {
        self.mutate(|doc| {
            let now = now_iso();
            let client = doc
                .clients
                .entry(client_id.to_string())
                .and_modify(|c| {
                    c.status = ClientStatus::Active;
                    c.last_activity.clone_from(&now);
                    tracing::info!(client_id, client_name, "client reconnected");
                })
                .or_insert_with(|| {
                    tracing::info!(client_id, client_name, "new client connected");
                    Client {
                        client_id: client_id.to_string(),
                        client_name: client_name.to_string(),
                        connected_at: now.clone(),
                        last_activity: now.clone(),
                        requests_count: 0,
                        tools_used: Vec::new(),
                        status: ClientStatus::Active,
                    }
                });
            Ok(client.clone())
        })
    }

    /// Record one request by `client_id`. Unknown clients are ignored.
    ///
    /// Returns whether the client was known.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn record_activity(&self, client_id: &str, tool: Option<&str>) -> Result<bool> {
        if !self.load()?.clients.contains_key(client_id) {
            tracing::warn!(client_id, "activity from unregistered client");
            return Ok(false);
        }
        self.mutate(|doc| {
            let Some(client) = doc.clients.get_mut(client_id) else {
                return Ok(false);
            };
            client.last_activity = now_iso();
            client.requests_count += 1;
            client.status = ClientStatus::Active;
            if let Some(tool) = tool {
                if !client.tools_used.iter().any(|t| t == tool) {
                    client.tools_used.push(tool.to_string());
                }
            }
            Ok(true)
        })
    }

    /// Mark a client as disconnected. Returns whether it was known.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn disconnect_client(&self, client_id: &str) -> Result<bool> {
        let known = self.mutate(|doc| {
            let Some(client) = doc.clients.get_mut(client_id) else {
                return Ok(false);
            };
            client.status = ClientStatus::Disconnected;
            client.last_activity = now_iso();
            Ok(true)
        })?;
        if known {
            tracing::info!(client_id, "client disconnected");
        }
        Ok(known)
    }

    /// Clients with status active.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    pub fn active_clients(&self) -> Result<Vec<Client>> {
        self.clients_with_status(Some(ClientStatus::Active))
    }

    /// Every known client, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    pub fn all_clients(&self) -> Result<Vec<Client>> {
        self.clients_with_status(None)
    }

    /// Clients with the given status, or all of them for `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    pub fn clients_with_status(&self, status: Option<ClientStatus>) -> Result<Vec<Client>> {
        Ok(self
            .load()?
            .clients
            .into_values()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .collect())
    }

    /// Look up a single client.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    pub fn client(&self, client_id: &str) -> Result<Option<Client>> {
        Ok(self.load()?.clients.remove(client_id))
    }

    /// Aggregate counts over every known client.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    pub fn stats(&self) -> Result<ConnectionStats> {
        let clients = self.load()?.clients;
        let count = |status| clients.values().filter(|c| c.status == status).count();
        Ok(ConnectionStats {
            total_clients: clients.len(),
            active_clients: count(ClientStatus::Active),
            idle_clients: count(ClientStatus::Idle),
            disconnected_clients: count(ClientStatus::Disconnected),
            total_requests: clients.values().map(|c| c.requests_count).sum(),
            timestamp: now_iso(),
        })
    }

    /// Mark active clients silent for longer than `threshold` as idle.
    ///
    /// Returns the number of clients changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn sweep_idle(&self, threshold: Duration) -> Result<usize> {
        let cutoff = Local::now() - threshold;
        let changed = self.mutate(|doc| {
            let mut changed = 0;
            for client in doc.clients.values_mut() {
                let stale = parse_timestamp(&client.last_activity).is_some_and(|t| t < cutoff);
                if client.status == ClientStatus::Active && stale {
                    client.status = ClientStatus::Idle;
                    changed += 1;
                }
            }
            Ok(changed)
        })?;
        if changed > 0 {
            tracing::debug!(changed, "clients marked idle");
        }
        Ok(changed)
    }

    /// Forget disconnected clients whose last activity is older than `days`.
    ///
    /// Returns the number of clients removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn cleanup_old_connections(&self, days: i64) -> Result<usize> {
        let Some(cutoff) = Duration::try_days(days).and_then(|d| Local::now().checked_sub_signed(d))
        else {
            return Ok(0);
        };
        let removed = self.mutate(|doc| {
            let before = doc.clients.len();
            doc.clients.retain(|_, c| {
                let expired = parse_timestamp(&c.last_activity).is_some_and(|t| t < cutoff);
                !(c.status == ClientStatus::Disconnected && expired)
            });
            Ok(before - doc.clients.len())
        })?;
        if removed > 0 {
            tracing::info!(removed, "old connections removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_monitor() -> (TempDir, ConnectionMonitor) {
        let dir = TempDir::new().unwrap();
        let monitor = ConnectionMonitor::new(dir.path().join("mcp_connections.json")).unwrap();
        (dir, monitor)
    }

    fn write_clients(dir: &TempDir, json: &str) -> ConnectionMonitor {
        let path = dir.path().join("mcp_connections.json");
        std::fs::write(&path, json).unwrap();
        ConnectionMonitor::new(path).unwrap()
    }

    #[test]
    fn test_register_new_client() {
        let (_dir, monitor) = create_test_monitor();
        let client = monitor.register_client("claude-desktop", "Claude Desktop").unwrap();
        assert_eq!(client.status, ClientStatus::Active);
        assert_eq!(client.connected_at, client.last_activity);
        assert_eq!(client.requests_count, 0);
    }

    #[test]
    fn test_register_existing_client_reactivates() {
        let (_dir, monitor) = create_test_monitor();
        let first = monitor.register_client("c1", "Client").unwrap();
        monitor.record_activity("c1", Some("list_tasks")).unwrap();
        monitor.disconnect_client("c1").unwrap();

        let again = monitor.register_client("c1", "Client").unwrap();
        assert_eq!(again.status, ClientStatus::Active);
        assert_eq!(again.connected_at, first.connected_at);
        assert_eq!(again.requests_count, 1);
    }

    #[test]
    fn test_record_activity() {
        let (_dir, monitor) = create_test_monitor();
        monitor.register_client("c1", "Client").unwrap();

        assert!(monitor.record_activity("c1", Some("create_task")).unwrap());
        assert!(monitor.record_activity("c1", Some("list_tasks")).unwrap());
        assert!(monitor.record_activity("c1", Some("create_task")).unwrap());
        assert!(monitor.record_activity("c1", None).unwrap());

        let client = monitor.client("c1").unwrap().unwrap();
        assert_eq!(client.requests_count, 4);
        assert_eq!(client.tools_used, vec!["create_task", "list_tasks"]);
    }

    #[test]
    fn test_record_activity_unknown_client_is_noop() {
        let (_dir, monitor) = create_test_monitor();
        assert!(!monitor.record_activity("ghost", Some("list_tasks")).unwrap());
        assert!(monitor.all_clients().unwrap().is_empty());
    }

    #[test]
    fn test_disconnect_client() {
        let (_dir, monitor) = create_test_monitor();
        monitor.register_client("c1", "Client").unwrap();
        assert!(monitor.disconnect_client("c1").unwrap());
        assert!(!monitor.disconnect_client("ghost").unwrap());

        assert!(monitor.active_clients().unwrap().is_empty());
        let client = monitor.client("c1").unwrap().unwrap();
        assert_eq!(client.status, ClientStatus::Disconnected);
    }

    #[test]
    fn test_stats() {
        let (_dir, monitor) = create_test_monitor();
        monitor.register_client("a", "A").unwrap();
        monitor.register_client("b", "B").unwrap();
        monitor.record_activity("a", Some("x")).unwrap();
        monitor.record_activity("b", Some("y")).unwrap();
        monitor.record_activity("b", Some("z")).unwrap();
        monitor.disconnect_client("b").unwrap();

        let stats = monitor.stats().unwrap();
        assert_eq!(stats.total_clients, 2);
        assert_eq!(stats.active_clients, 1);
        assert_eq!(stats.idle_clients, 0);
        assert_eq!(stats.disconnected_clients, 1);
        assert_eq!(stats.total_requests, 3);
    }

    #[test]
    fn test_clients_with_status() {
        let (_dir, monitor) = create_test_monitor();
        monitor.register_client("a", "A").unwrap();
        monitor.register_client("b", "B").unwrap();
        monitor.disconnect_client("a").unwrap();

        let gone = monitor.clients_with_status(Some(ClientStatus::Disconnected)).unwrap();
        assert_eq!(gone.len(), 1);
        assert_eq!(gone[0].client_id, "a");
        assert_eq!(monitor.clients_with_status(None).unwrap().len(), 2);
    }

    #[test]
    fn test_sweep_idle() {
        let dir = TempDir::new().unwrap();
        let monitor = write_clients(
            &dir,
            r#"{"clients": {
                "old": {"client_id": "old", "client_name": "Old", "connected_at": "2020-01-01T00:00:00",
                        "last_activity": "2020-01-01T00:00:00", "status": "active"}
            }}"#,
        );
        monitor.register_client("fresh", "Fresh").unwrap();

        assert_eq!(monitor.sweep_idle(Duration::minutes(5)).unwrap(), 1);
        assert_eq!(monitor.client("old").unwrap().unwrap().status, ClientStatus::Idle);
        assert_eq!(monitor.client("fresh").unwrap().unwrap().status, ClientStatus::Active);
    }

    #[test]
    fn test_cleanup_old_connections() {
        let dir = TempDir::new().unwrap();
        let monitor = write_clients(
            &dir,
            r#"{"clients": {
                "stale": {"client_id": "stale", "client_name": "S", "connected_at": "2020-01-01T00:00:00",
                          "last_activity": "2020-01-01T00:00:00", "status": "disconnected"},
                "idle": {"client_id": "idle", "client_name": "I", "connected_at": "2020-01-01T00:00:00",
                         "last_activity": "2020-01-01T00:00:00", "status": "idle"}
            }}"#,
        );
        monitor.register_client("recent", "R").unwrap();
        monitor.disconnect_client("recent").unwrap();

        assert_eq!(monitor.cleanup_old_connections(7).unwrap(), 1);
        let ids: Vec<String> =
            monitor.all_clients().unwrap().into_iter().map(|c| c.client_id).collect();
        assert_eq!(ids, vec!["idle", "recent"]);
    }

    #[test]
    fn test_persisted_document_shape() {
        let (_dir, monitor) = create_test_monitor();
        monitor.register_client("c1", "Client").unwrap();
        let raw = std::fs::read_to_string(monitor.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["clients"]["c1"]["status"], "active");
        assert!(value["last_updated"].is_string());
    }
}
