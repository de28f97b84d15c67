//! REST routes over the task store.
//!
//! Bodies carry the raw stored records. Store calls do blocking file I/O
//! under a lock, so they run on the blocking thread pool.

use crate::config::Settings;
use crate::filesystem::FileSystem;
use crate::messages;
use crate::tasks::{CompleteOutcome, DeleteOutcome, JsonTaskStore, StatusFilter, TaskStore};
use crate::time::now_iso;
use crate::tools::{Tool, ToolGroup};
use crate::web::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Tasks returned by `GET /api/tasks` when no limit is given.
const DEFAULT_TASKS_LIMIT: usize = 50;
/// Notes returned by `GET /api/notes` when no limit is given.
const DEFAULT_NOTES_LIMIT: usize = 20;
/// Log lines returned by `GET /api/logs` when no limit is given.
const DEFAULT_LOG_LINES: usize = 100;
/// Log lines included in `GET /api/status`.
const STATUS_LOG_LINES: usize = 10;

/// Shared state of the REST facade.
#[derive(Clone)]
pub struct AppState {
    /// The task and note store.
    pub store: Arc<JsonTaskStore>,
    /// Effective settings.
    pub settings: Arc<Settings>,
    /// Sandbox built from the allowed directories that exist.
    pub fs: Arc<FileSystem>,
}

impl AppState {
    /// Open the store named in `settings` and resolve its allowed directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be initialized.
    pub fn from_settings(settings: Settings) -> crate::Result<Self> {
        let store = JsonTaskStore::new(&settings.tasks_db_path)?;
        let fs = FileSystem::new(&settings.allowed_directories, settings.max_file_size);
        Ok(Self { store: Arc::new(store), settings: Arc::new(settings), fs: Arc::new(fs) })
    }
}

/// Run a store call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(ApiError::from)
}

/// Routes under `/api` plus `/health`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}/complete", post(complete_task))
        .route("/api/tasks/{id}", get(get_task).delete(delete_task))
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/search/tasks", get(search_tasks))
        .route("/api/metrics", get(metrics))
        .route("/api/logs", get(logs))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "personal-mcp",
        "version": crate::VERSION,
    }))
}

async fn status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.store);
    let stats = blocking(move || store.stats()).await?;

    let settings = Arc::clone(&state.settings);
    let (exists, last_lines) = blocking(move || {
        let api_log = &settings.api_log_file;
        let mcp_log = &settings.log_file;
        let exists = api_log.exists() || mcp_log.exists();
        let source = if api_log.exists() { api_log } else { mcp_log };
        let (lines, _) = tail_log(source, STATUS_LOG_LINES, None)?;
        Ok((exists, lines))
    })
    .await?;

    let tools_by_group: serde_json::Map<String, Value> = ToolGroup::ALL
        .into_iter()
        .map(|group| (group.as_str().to_string(), json!(Tool::in_group(group).count())))
        .collect();

    Ok(Json(json!({
        "status": "running",
        "initialized": true,
        "modules": {
            "tasks": true,
            "filesystem": state.fs.is_available(),
        },
        "stats": {
            "tasks": stats.pending,
            "completed": stats.completed,
            "notes": stats.notes,
            "tools": Tool::ALL.len(),
            "tools_by_group": tools_by_group,
            "total_tasks": stats.total,
        },
        "logs": {
            "exists": exists,
            "last_lines": last_lines,
        },
        "timestamp": now_iso(),
    })))
}

#[derive(Debug, Deserialize)]
struct ListTasksQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = StatusFilter::parse_or_default(query.status.as_deref().unwrap_or("all"));
    let limit = query.limit.unwrap_or(DEFAULT_TASKS_LIMIT);

    let store = Arc::clone(&state.store);
    let (page, stats) =
        blocking(move || Ok((store.list_tasks(filter, limit)?, store.stats()?))).await?;
    tracing::info!(status = %filter, shown = page.tasks.len(), "listing tasks");

    let filtered = page.tasks.len() + page.remaining;
    Ok(Json(json!({
        "tasks": page.tasks,
        "total": stats.total,
        "filtered": filtered,
        "pending": stats.pending,
        "completed": stats.completed,
    })))
}

#[derive(Debug, Deserialize)]
struct NewTask {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    due_date: String,
}

async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<NewTask>,
) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.store);
    let task = blocking(move || {
        store.create_task(
            &body.title,
            &body.description,
            body.priority.as_deref().unwrap_or("medium"),
            &body.due_date,
        )
    })
    .await?;
    tracing::info!(id = task.id, title = %task.title, "task created");

    Ok(Json(json!({
        "success": true,
        "message": messages::task_created(&task),
        "task": task,
    })))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.store);
    let task = blocking(move || store.get_task(id)?.ok_or(crate::Error::TaskNotFound(id))).await?;
    Ok(Json(json!({ "task": task })))
}

async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.store);
    let outcome = blocking(move || store.complete_task(id)).await?;
    let task = match &outcome {
        CompleteOutcome::Completed(task) | CompleteOutcome::AlreadyCompleted(task) => task.clone(),
    };
    tracing::info!(id, title = %task.title, "task completed");

    Ok(Json(json!({
        "success": true,
        "message": messages::task_completion(id, Ok(outcome))?,
        "task": task,
    })))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.store);
    let outcome = blocking(move || store.delete_task(id, true)).await?;
    if let DeleteOutcome::Deleted(task) = &outcome {
        tracing::info!(id, title = %task.title, "task deleted");
    }

    Ok(Json(json!({
        "success": true,
        "message": messages::task_deletion(id, Ok(outcome))?,
    })))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    #[serde(default)]
    limit: Option<usize>,
}

async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_NOTES_LIMIT);
    let store = Arc::clone(&state.store);
    let page = blocking(move || store.list_notes(limit)).await?;

    let total = page.notes.len() + page.remaining;
    Ok(Json(json!({ "notes": page.notes, "total": total })))
}

#[derive(Debug, Deserialize)]
struct NewNote {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: String,
}

async fn create_note(
    State(state): State<AppState>,
    Json(body): Json<NewNote>,
) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.store);
    let note = blocking(move || store.create_note(&body.title, &body.content, &body.tags)).await?;
    tracing::info!(id = note.id, title = %note.title, "note created");

    Ok(Json(json!({
        "success": true,
        "message": messages::note_created(&note),
        "note": note,
    })))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search_tasks(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    if query.q.trim().is_empty() {
        return Ok(Json(json!({ "tasks": [], "count": 0 })));
    }
    let store = Arc::clone(&state.store);
    let q = query.q.clone();
    let tasks = blocking(move || store.search_tasks(&q)).await?;

    Ok(Json(json!({
        "count": tasks.len(),
        "tasks": tasks,
        "query": query.q,
    })))
}

async fn metrics(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.store);
    let stats = blocking(move || store.stats()).await?;

    Ok(Json(json!({
        "tasks": {
            "total": stats.total,
            "pending": stats.pending,
            "completed": stats.completed,
            "completion_rate": stats.completion_rate,
        },
        "priority": {
            "high": stats.high,
            "medium": stats.medium,
            "low": stats.low,
        },
        "notes": { "total": stats.notes },
        "timestamp": now_iso(),
    })))
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    level: Option<String>,
}

async fn logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LINES);
    let level = query.level.as_deref().and_then(log_level_token);
    let path = state.settings.api_log_file.clone();

    let (lines, total) = blocking(move || tail_log(&path, limit, level)).await?;
    Ok(Json(json!({
        "filtered": lines.len(),
        "logs": lines,
        "total": total,
    })))
}

/// The level token written by the log formatter, or `None` for "all".
fn log_level_token(level: &str) -> Option<&'static str> {
    match level.trim().to_uppercase().as_str() {
        "TRACE" => Some("TRACE"),
        "DEBUG" => Some("DEBUG"),
        "INFO" => Some("INFO"),
        "WARN" | "WARNING" => Some("WARN"),
        "ERROR" | "CRITICAL" => Some("ERROR"),
        _ => None,
    }
}

/// Last `limit` lines of a log file, optionally restricted to one level.
///
/// Returns the lines and the number of lines that matched the filter. A
/// missing file yields no lines.
fn tail_log(
    path: &std::path::Path,
    limit: usize,
    level: Option<&str>,
) -> crate::Result<(Vec<String>, usize)> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
        Err(e) => return Err(e.into()),
    };
    let matching: Vec<&str> = content
        .lines()
        .filter(|line| level.map_or(true, |lvl| line.split_whitespace().take(3).any(|t| t == lvl)))
        .collect();
    let total = matching.len();
    let lines =
        matching[total.saturating_sub(limit)..].iter().map(|l| l.trim().to_string()).collect();
    Ok((lines, total))
}

/// Directory served as the front end, if configured and present.
pub(crate) fn static_dir(settings: &Settings) -> Option<PathBuf> {
    settings.static_dir.clone().filter(|dir| dir.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(dir: &TempDir) -> AppState {
        let settings = Settings {
            tasks_db_path: dir.path().join("tasks.json"),
            api_log_file: dir.path().join("api.log"),
            log_file: dir.path().join("mcp.log"),
            ..Settings::default()
        };
        AppState::from_settings(settings).unwrap()
    }

    fn app(state: &AppState) -> Router {
        api_routes().with_state(state.clone())
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let (status, body) = send(app(&state), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_create_and_list_tasks() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let (status, body) = send(
            app(&state),
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "Low one", "priority": "low" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["task"]["id"], 1);
        assert_eq!(body["task"]["priority"], "low");

        send(
            app(&state),
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "High one", "priority": "high" })),
        )
        .await;

        let (status, body) = send(app(&state), Method::GET, "/api/tasks", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["filtered"], 2);
        assert_eq!(body["pending"], 2);
        assert_eq!(body["tasks"][0]["title"], "High one");
    }

    #[tokio::test]
    async fn test_create_task_validation_error() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let (status, body) =
            send(app(&state), Method::POST, "/api/tasks", Some(json!({ "title": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_complete_and_delete() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state.store.create_task("Pay rent", "", "high", "").unwrap();

        let (status, body) = send(app(&state), Method::GET, "/api/tasks/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["title"], "Pay rent");
        let (status, body) = send(app(&state), Method::GET, "/api/tasks/9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "task #9 not found");

        let (status, body) =
            send(app(&state), Method::POST, "/api/tasks/1/complete", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["completed"], true);

        let (status, _) = send(app(&state), Method::POST, "/api/tasks/9/complete", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(app(&state), Method::DELETE, "/api/tasks/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(state.store.tasks().unwrap().is_empty());

        let (status, _) = send(app(&state), Method::DELETE, "/api/tasks/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_completed_filter() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state.store.create_task("A", "", "high", "").unwrap();
        state.store.create_task("B", "", "low", "").unwrap();
        state.store.complete_task(2).unwrap();

        let (_, body) =
            send(app(&state), Method::GET, "/api/tasks?status=completed", None).await;
        assert_eq!(body["filtered"], 1);
        assert_eq!(body["tasks"][0]["title"], "B");
        assert_eq!(body["total"], 2);
    }

    #[tokio::test]
    async fn test_notes() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let (status, body) = send(
            app(&state),
            Method::POST,
            "/api/notes",
            Some(json!({ "title": "Idea", "content": "Write more", "tags": "a, b" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["note"]["tags"], json!(["a", "b"]));

        let (_, body) = send(app(&state), Method::GET, "/api/notes", None).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["notes"][0]["title"], "Idea");
    }

    #[tokio::test]
    async fn test_search() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state.store.create_task("Buy milk", "", "medium", "").unwrap();
        state.store.create_task("Call mom", "about MILK prices", "medium", "").unwrap();

        let (_, body) = send(app(&state), Method::GET, "/api/search/tasks?q=milk", None).await;
        assert_eq!(body["count"], 2);

        let (_, body) = send(app(&state), Method::GET, "/api/search/tasks", None).await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["tasks"], json!([]));
    }

    #[tokio::test]
    async fn test_metrics_and_status() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state.store.create_task("A", "", "high", "").unwrap();
        state.store.create_task("B", "", "low", "").unwrap();
        state.store.complete_task(1).unwrap();

        let (_, body) = send(app(&state), Method::GET, "/api/metrics", None).await;
        assert_eq!(body["tasks"]["total"], 2);
        assert_eq!(body["tasks"]["completion_rate"], 50.0);
        assert_eq!(body["priority"]["high"], 0);
        assert_eq!(body["priority"]["low"], 1);

        let (_, body) = send(app(&state), Method::GET, "/api/status", None).await;
        assert_eq!(body["status"], "running");
        assert_eq!(body["stats"]["tasks"], 1);
        assert_eq!(body["stats"]["total_tasks"], 2);
        assert_eq!(body["stats"]["tools"], 17);
        assert_eq!(body["logs"]["exists"], false);
        assert_eq!(body["modules"]["filesystem"], false);
        assert_eq!(body["stats"]["tools_by_group"]["filesystem"], 7);
        assert_eq!(body["stats"]["tools_by_group"]["connections"], 3);
    }

    #[tokio::test]
    async fn test_status_reports_only_existing_directories() {
        let dir = TempDir::new().unwrap();
        let missing = AppState::from_settings(Settings {
            tasks_db_path: dir.path().join("tasks.json"),
            allowed_directories: vec![dir.path().join("nope")],
            ..Settings::default()
        })
        .unwrap();
        let (_, body) = send(app(&missing), Method::GET, "/api/status", None).await;
        assert_eq!(body["modules"]["filesystem"], false);

        let present = AppState::from_settings(Settings {
            tasks_db_path: dir.path().join("tasks.json"),
            allowed_directories: vec![dir.path().to_path_buf()],
            ..Settings::default()
        })
        .unwrap();
        let (_, body) = send(app(&present), Method::GET, "/api/status", None).await;
        assert_eq!(body["modules"]["filesystem"], true);
    }

    #[tokio::test]
    async fn test_logs_endpoint() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        fs::write(
            dir.path().join("api.log"),
            "2025-01-20T10:00:00Z  INFO personal_mcp: one\n\
             2025-01-20T10:00:01Z  WARN personal_mcp: two\n\
             2025-01-20T10:00:02Z  INFO personal_mcp: three\n",
        )
        .unwrap();

        let (_, body) = send(app(&state), Method::GET, "/api/logs?limit=2", None).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["filtered"], 2);
        assert!(body["logs"][1].as_str().unwrap().ends_with("three"));

        let (_, body) = send(app(&state), Method::GET, "/api/logs?level=warning", None).await;
        assert_eq!(body["total"], 1);
        assert!(body["logs"][0].as_str().unwrap().ends_with("two"));
    }

    #[test]
    fn test_tail_log_missing_file() {
        let dir = TempDir::new().unwrap();
        let (lines, total) = tail_log(&dir.path().join("none.log"), 10, None).unwrap();
        assert!(lines.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_log_level_token() {
        assert_eq!(log_level_token("all"), None);
        assert_eq!(log_level_token("critical"), Some("ERROR"));
        assert_eq!(log_level_token("Info"), Some("INFO"));
    }
}
