use anyhow::{Context, Result};
use common::DocumentStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{AppConfig, AppState, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting API service");

    let config = AppConfig::from_env();

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .with_context(|| format!("creating uploads dir {}", config.uploads_dir.display()))?;

    let store = DocumentStore::open(&config.data_file, config.sqlite_file.as_deref()).await;
    if store.sqlite_active() {
        info!("Store backend: sqlite with json fallback");
    } else {
        info!("Store backend: json file ({})", config.data_file.display());
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(store, config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API service listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
