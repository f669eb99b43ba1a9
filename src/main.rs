use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vote_board::common::AppState;
use vote_board::config::Config;
use vote_board::refresh::scheduler;
use vote_board::routes;
use vote_board::sheets::ServiceAccountConnector;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vote_board=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting vote-board...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        deployment = ?config.deployment,
        host = %config.api_host,
        port = config.api_port,
        refresh_mode = ?config.refresh_mode,
        cache_ttl_secs = config.cache_ttl_seconds,
        "Configuration loaded"
    );

    let connector = ServiceAccountConnector::new(Arc::new(config.clone()));
    let state = AppState::new(config.clone(), Box::new(connector));

    // Establish the shared connection up front; a failure here is retried
    // by the first render pass and shown on the dashboard.
    match state.controller.acquire_connection().await {
        Ok(_) => tracing::info!("Data source connection established"),
        Err(e) => tracing::warn!(error = %e, "Data source connection not available yet"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tracing::info!("Spawning refresh scheduler...");
    let scheduler_task = tokio::spawn(scheduler::run_refresh_cycle(state.clone(), shutdown_rx));

    // Build router
    let app = routes::build_router(state);

    // Start server with graceful shutdown
    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting server");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        tracing::error!(error = %e, "Refresh scheduler task failed");
    }

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
