use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use domain::services::PendingWriteQueue;
use tracing::{info, warn};

use wishlist_api::app::{create_app, AppState};
use wishlist_api::config::Config;
use wishlist_api::jobs::{JobScheduler, PendingWriteReplayJob, PoolMetricsJob, RateLimitPruneJob};
use wishlist_api::middleware::{init_metrics, logging::init_logging};
use wishlist_api::services::AdminWriter;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging);
    init_metrics()?;

    info!("Starting Birthday Wishlist API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let pending_writes = if config.queue.persist_path.is_empty() {
        PendingWriteQueue::in_memory()
    } else {
        PendingWriteQueue::open(&config.queue.persist_path).await?
    };
    let pending_writes = Arc::new(pending_writes);
    if !pending_writes.is_empty().await {
        info!(
            queued = pending_writes.len().await,
            "Loaded pending writes from a previous run"
        );
    }

    let addr = config.socket_addr()?;
    let state = AppState::new(config, pool.clone(), Arc::clone(&pending_writes))?;

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.register(PendingWriteReplayJob::new(
        pool.clone(),
        pending_writes,
        Arc::new(AdminWriter::new(pool)),
        state.config.queue.replay_interval_secs,
    ));
    if let Some(limiter) = &state.rate_limiter {
        scheduler.register(RateLimitPruneJob::new(Arc::clone(limiter)));
    }
    scheduler.start();

    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}
