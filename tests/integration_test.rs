//! Integration tests for `personal_mcp`.

use personal_mcp::connections::{ClientStatus, ConnectionMonitor};
use personal_mcp::tasks::{
    CompleteOutcome, DeleteOutcome, JsonTaskStore, StatusFilter, StoreDocument, TaskStore,
};
use personal_mcp::VERSION;
use tempfile::TempDir;

#[test]
fn test_version_exists() {
    assert!(!VERSION.is_empty());
}

#[test]
fn test_task_lifecycle_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("tasks.json");

    let (before_tasks, before_notes) = {
        let store = JsonTaskStore::new(&path).unwrap();
        store.create_task("Buy milk", "2 litres", "high", "tomorrow").unwrap();
        store.create_task("Walk dog", "", "bogus", "").unwrap();
        store.create_note("Ideas", "Paint the fence", "home, ,garden").unwrap();
        store.create_note("Later", "Fix the gate", "").unwrap();
        assert!(matches!(store.complete_task(1).unwrap(), CompleteOutcome::Completed(_)));
        (store.tasks().unwrap(), store.notes().unwrap())
    };

    let store = JsonTaskStore::new(&path).unwrap();
    let tasks = store.tasks().unwrap();
    assert_eq!(tasks, before_tasks);
    assert_eq!(store.notes().unwrap(), before_notes);
    assert_eq!(tasks.len(), 2);
    assert!(tasks[0].completed);
    assert!(tasks[0].completed_at.is_some());
    assert_eq!(tasks[1].priority.as_str(), "medium");

    let pending = store.list_tasks(StatusFilter::Pending, 20).unwrap();
    assert_eq!(pending.tasks.len(), 1);
    assert_eq!(pending.tasks[0].title, "Walk dog");

    let notes = store.list_notes(10).unwrap();
    assert_eq!(notes.notes[0].title, "Later");
    assert_eq!(notes.notes[1].tags, vec!["home", "garden"]);

    // Ids keep counting after a restart.
    let task = store.create_task("Third", "", "low", "").unwrap();
    assert_eq!(task.id, 3);
}

#[test]
fn test_deleted_ids_are_not_reused() {
    let dir = TempDir::new().unwrap();
    let store = JsonTaskStore::new(dir.path().join("tasks.json")).unwrap();
    store.create_task("One", "", "medium", "").unwrap();
    store.create_task("Two", "", "medium", "").unwrap();

    assert_eq!(store.delete_task(2, false).unwrap(), DeleteOutcome::ConfirmationRequired);
    assert!(matches!(store.delete_task(2, true).unwrap(), DeleteOutcome::Deleted(_)));
    assert_eq!(store.create_task("Three", "", "medium", "").unwrap().id, 3);
}

#[test]
fn test_processes_sharing_a_file_see_each_other() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    let mcp_side = JsonTaskStore::new(&path).unwrap();
    let api_side = JsonTaskStore::new(&path).unwrap();

    mcp_side.create_task("From MCP", "", "high", "").unwrap();
    api_side.create_task("From API", "", "low", "").unwrap();

    let titles: Vec<_> = mcp_side.tasks().unwrap().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["From MCP", "From API"]);
}

#[test]
fn test_on_disk_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    let store = JsonTaskStore::new(&path).unwrap();
    store.create_task("Check format", "", "high", "").unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n  \"tasks\": ["), "{content}");
    let doc: StoreDocument = serde_json::from_str(&content).unwrap();
    assert_eq!(doc.next_task_id, 2);
    assert_eq!(doc.next_note_id, 1);
    assert!(doc.last_updated.is_some());
}

#[test]
fn test_stale_counter_is_rederived() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(
        &path,
        r#"{
  "tasks": [
    {"id": 7, "title": "Legacy", "priority": "urgent", "created_at": "2024-01-01T00:00:00"}
  ],
  "notes": [],
  "next_task_id": 2
}"#,
    )
    .unwrap();

    let store = JsonTaskStore::new(&path).unwrap();
    assert_eq!(store.tasks().unwrap()[0].priority.as_str(), "medium");
    assert_eq!(store.create_task("New", "", "low", "").unwrap().id, 8);
}

#[test]
fn test_corrupt_store_is_preserved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonTaskStore::new(&path).unwrap();
    assert!(store.tasks().unwrap().is_empty());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("tasks.json.corrupt")).unwrap(),
        "{ not json"
    );
}

#[test]
fn test_connection_tracking() {
    let dir = TempDir::new().unwrap();
    let monitor = ConnectionMonitor::new(dir.path().join("connections.json")).unwrap();

    monitor.register_client("desk", "Desktop").unwrap();
    monitor.record_activity("desk", Some("list_tasks")).unwrap();
    monitor.record_activity("desk", Some("list_tasks")).unwrap();
    assert!(!monitor.record_activity("ghost", Some("list_tasks")).unwrap());

    let client = monitor.client("desk").unwrap().unwrap();
    assert_eq!(client.requests_count, 2);
    assert_eq!(client.tools_used, vec!["list_tasks"]);

    monitor.disconnect_client("desk").unwrap();
    let stats = monitor.stats().unwrap();
    assert_eq!(stats.total_clients, 1);
    assert_eq!(stats.disconnected_clients, 1);
    assert_eq!(
        monitor.clients_with_status(Some(ClientStatus::Disconnected)).unwrap().len(),
        1
    );
}
