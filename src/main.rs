//! Rice Leaf Disease Classification Service
//!
//! Classifies uploaded paddy leaf photos and manages a small API-key table.
//! Serves an HTML upload form and a JSON API over Axum.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use paddyscan::api::rest::{create_rest_router, AppState};
use paddyscan::config::Config;
use paddyscan::engine::load_classifier;
use paddyscan::service::{ClassifyService, UploadStore};
use paddyscan::storage::SqliteStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Starting Paddy Scan v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load(&Config::default_path()).unwrap_or_else(|e| {
        info!("Using default config ({})", e);
        Config::default()
    });

    info!("Configuration loaded:");
    info!("  Port: {}", config.server.port);
    info!("  Classifier: {}", config.classifier.kind.as_str());
    info!("  Model: {}", config.classifier.model.display());
    info!("  Upload dir: {}", config.upload.dir.display());
    info!("  Body limit: {}MB", config.server.body_limit_mb);

    // Load the classifier up front; serving without a model is pointless
    let classifier = load_classifier(&config.classifier)?;

    // Initialize storage
    let storage_path = config
        .storage
        .sqlite_path
        .to_str()
        .context("SQLite path is not valid UTF-8")?;
    let storage = Arc::new(SqliteStorage::new(storage_path).await?);
    let seeded = storage.seed(&config.storage.seed_keys).await?;
    info!("SQLite storage initialized at: {} ({} keys seeded)", storage_path, seeded);

    // Prepare upload directory
    let uploads = UploadStore::new(&config.upload.dir);
    uploads
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create {}", config.upload.dir.display()))?;

    // Create REST app state
    let app_state = Arc::new(AppState {
        service: Arc::new(ClassifyService::new(classifier, uploads)),
        storage,
        body_limit_bytes: config.body_limit_bytes(),
        start_time: Instant::now(),
    });

    let router = create_rest_router(app_state);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Paddy Scan is ready!");
    info!("HTTP: http://localhost:{}/", config.server.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received, cleaning up...");
        })
        .await?;

    info!("Goodbye!");
    Ok(())
}
