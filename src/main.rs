//! Libreria Server - Library Catalog
//!
//! A Rust REST API server for a library's book catalog.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libreria_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    tracing::info!("Starting Libreria Server v{}", env!("CARGO_PKG_VERSION"));

    // Open the book store (connects and migrates when backed by PostgreSQL)
    let store = repository::open(&config.database)
        .await
        .context("Failed to open book store")?;

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", config.server.host))?,
        config.server.port,
    );
    let shutdown_grace = config.server.shutdown_grace();

    // Create application state
    let services = Arc::new(Services::new(store));
    let state = AppState {
        config: Arc::new(config),
        services: services.clone(),
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let server_token = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_token.cancelled().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Server stopped on its own, before any shutdown signal
            result??;
        }
        _ = shutdown.cancelled() => {
            tracing::info!(
                "Shutdown signal received, draining in-flight requests for up to {:?}",
                shutdown_grace
            );
            match tokio::time::timeout(shutdown_grace, &mut server).await {
                Ok(result) => result??,
                Err(_) => {
                    tracing::warn!("Shutdown grace period elapsed, abandoning in-flight requests");
                    server.abort();
                }
            }
        }
    }

    services.books.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "libreria_server={level},tower_http={level}",
            level = logging.level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        _ = terminate => tracing::info!("Received SIGTERM signal"),
    }

    token.cancel();
}
