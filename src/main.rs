// Plant Health Server - HTTP entry point

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use plant_health_server::utils::logging;
use plant_health_server::{router, AppState, ConfigService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    tracing::info!("Plant Health Server v{} starting up...", env!("CARGO_PKG_VERSION"));

    let config = ConfigService::from_env()
        .context("Failed to load configuration")?
        .get_config_clone();

    let shutdown = CancellationToken::new();
    let state = AppState::initialize(config.clone(), shutdown.clone())
        .await
        .context("Failed to initialize services")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    tracing::info!("[Server] Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    tracing::info!("[Server] Stopped");
    Ok(())
}

/// Resolve on Ctrl-C, cancelling in-flight requests first.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[Server] Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[Server] Shutdown requested");
    shutdown.cancel();
}
