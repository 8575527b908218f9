use anyhow::Result;
use std::sync::Arc;

use promo::{logging, router, AppState, Configuration};
use promo_auth::CredentialStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let configuration = Configuration::new()?;

    // Held until exit so buffered file logs are flushed
    let _log_guard = logging::init_logging(configuration.server.log_dir.as_deref())?;
    tracing::info!("Configuration loaded successfully");

    // Initialize services
    let credentials = Arc::new(CredentialStore::load(&configuration.server.token_file).await?);
    let app_state = AppState::from_configuration(&configuration, credentials)?;

    let app = router(app_state);

    // Start server
    let addr = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
