//! MCP server binary for the personal assistant.
//!
//! Speaks the protocol over stdio, so nothing but protocol messages may be
//! written to stdout. Logs go to the configured log file.

use personal_mcp::config::Settings;
use personal_mcp::logging::{self, Console};
use personal_mcp::mcp::AssistantServer;
use personal_mcp::templates;
use rmcp::ServiceExt;
use std::time::Duration;

/// Identifier the server registers itself under.
const SERVER_CLIENT_ID: &str = "mcp-server";

/// How often idle clients are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Active clients silent for this long are marked idle.
const IDLE_AFTER_MINUTES: i64 = 5;

/// Disconnected clients older than this are forgotten at startup.
const CLEANUP_DAYS: i64 = 7;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    settings.ensure_directories()?;

    let console = if settings.debug { Console::StderrErrors } else { Console::Off };
    if let Err(e) = logging::init(&settings.log_file, settings.level(), console) {
        eprintln!("Warning: logging init failed: {e}");
    }
    logging::install_panic_hook();
    settings.log_load_warnings();

    templates::init_templates(settings.templates_dir.as_deref())?;

    let server = AssistantServer::from_settings(&settings)?;
    let monitor = server.monitor().clone();

    match monitor.cleanup_old_connections(CLEANUP_DAYS) {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "old connections removed"),
        Err(e) => tracing::warn!(error = %e, "connection cleanup failed"),
    }
    monitor.register_client(SERVER_CLIENT_ID, "MCP Server")?;
    monitor.register_client(&settings.client_id, &settings.client_name)?;

    let sweeper = {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let threshold = chrono::Duration::minutes(IDLE_AFTER_MINUTES);
                match monitor.sweep_idle(threshold) {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(clients = n, "clients marked idle"),
                    Err(e) => tracing::warn!(error = %e, "idle sweep failed"),
                }
            }
        })
    };

    tracing::info!(
        tasks = %settings.tasks_db_path.display(),
        filesystem = !settings.allowed_directories.is_empty(),
        "MCP server created, starting stdio transport"
    );
    let service = server.serve(rmcp::transport::stdio()).await?;
    tracing::info!("MCP server running");
    service.waiting().await?;

    sweeper.abort();
    for id in [settings.client_id.as_str(), SERVER_CLIENT_ID] {
        if let Err(e) = monitor.disconnect_client(id) {
            tracing::warn!(client_id = id, error = %e, "failed to mark client disconnected");
        }
    }
    tracing::info!("MCP server stopped");

    Ok(())
}
