//! REST API binary for the browser front end.

use personal_mcp::config::Settings;
use personal_mcp::logging::{self, Console};
use personal_mcp::web;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    settings.ensure_directories()?;

    logging::init(&settings.api_log_file, settings.level(), Console::Stdout)?;
    logging::install_panic_hook();
    settings.log_load_warnings();

    tracing::info!(host = %settings.host, port = settings.port, "starting REST API");
    web::serve(settings).await?;
    Ok(())
}
