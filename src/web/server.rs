//! HTTP server wiring for the REST facade.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::web::routes::{api_routes, static_dir, AppState};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Build the application router: API routes, CORS, and the optional static
/// front end as fallback.
pub fn build_router(state: AppState) -> Router {
    let static_dir = static_dir(&state.settings);
    let mut app = api_routes().with_state(state);

    if let Some(dir) = static_dir {
        tracing::info!(dir = %dir.display(), "serving static files");
        app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_SIZE)).layer(CorsLayer::permissive())
}

/// Bind to the configured address and serve until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the address is invalid or
/// the listener fails.
pub async fn serve(settings: Settings) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| Error::Config(format!("invalid address: {e}")))?;

    let state = AppState::from_settings(settings)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST API listening on http://{addr}");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("REST API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
