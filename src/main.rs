use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use persons_graphql::app_state::AppState;
use persons_graphql::build_router;
use persons_graphql::config::Config;
use persons_graphql::db::pool::get_database;
use persons_graphql::db::queries::person::{MongoPersonStore, PersonStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref())?;

    let database = get_database(&config)
        .await
        .context("Failed to configure the MongoDB client")?;
    let store: Arc<dyn PersonStore> = Arc::new(MongoPersonStore::new(database));

    // The driver connects lazily; report an unreachable store early without refusing to start.
    if let Err(e) = store.ping().await {
        warn!("MongoDB is not reachable yet: {}", e);
    }

    match config.issuer() {
        Some(issuer) => info!(%issuer, client_id = %config.client_id, "Verifying tokens against identity provider"),
        None => warn!("No OIDC_ISSUER_URI set, verifying HS256 tokens with JWT_SECRET"),
    }

    let state = AppState::from_config(&config, store);
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Server running at http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server encountered an error")?;

    info!("Shutdown complete.");
    Ok(())
}

/// Console logging, plus a daily-rolling file under `log_dir` when set.
/// The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "persons-graphql.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .init();
            Ok(None)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
