//! Lector Server
//!
//! Accepts page photos over HTTP, narrates them and serves spell-check
//! annotations.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lector_server::{routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lector_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!("Starting Lector Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Uploads: {}", config.storage.upload_dir.display());
    tracing::info!("Annotated images: {}", config.storage.annotated_dir.display());
    tracing::info!("Audio: {}", config.storage.audio_dir.display());
    tracing::info!("PaddleOCR: {}", config.ocr.paddle_url);
    tracing::info!("Review model: {} at {}", config.review.model, config.review.ollama_url);

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid SERVER_HOST: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    // Create application state
    let state = AppState::new(config);
    state
        .storage()
        .ensure_dirs()
        .await
        .context("Failed to create output directories")?;

    let app = routes::app(state);

    // Start server with graceful shutdown
    tracing::info!("Lector Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
