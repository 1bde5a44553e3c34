//! Codedrop Server
//!
//! Main entry point for the Codedrop file-share service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codedrop_api::{AppState, create_router};
use codedrop_core::transfer::DownloadPolicy;
use codedrop_core::{Clock, RandomCodeGenerator, Sweeper, SystemClock, TransferService, store};
use codedrop_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codedrop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Open blob store
    let store = store::from_config(&config.storage, Arc::new(RandomCodeGenerator))?;
    if config.storage.is_durable() {
        info!(storage = store.backend_name(), "Blob store ready");
    } else {
        warn!(
            storage = store.backend_name(),
            "Blob store is in-memory; uploads are lost on restart"
        );
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let download_policy = DownloadPolicy::from_one_time(config.download.one_time);
    let transfer = TransferService::new(store.clone(), clock.clone())
        .with_max_file_size(config.upload.max_file_size)
        .with_download_policy(download_policy);
    info!(
        max_file_size = config.upload.max_file_size,
        ?download_policy,
        "Transfer service configured"
    );

    // Start sweeper
    let shutdown = CancellationToken::new();
    let sweeper = config.sweeper.enabled.then(|| {
        Sweeper::new(
            store,
            clock,
            Duration::from_secs(config.sweeper.interval_secs.max(1)),
        )
        .spawn(shutdown.clone())
    });
    if sweeper.is_none() {
        warn!("Sweeper disabled; expired files stay in storage until overwritten");
    }

    // Create router
    let app = create_router(AppState::new(transfer));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        handle.await?;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
        }
        () = shutdown.cancelled() => {}
    }
    info!("Shutting down");
}
