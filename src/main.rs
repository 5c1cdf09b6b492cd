//! Quote consensus server.

use anyhow::{Context, Result};
use clap::Parser;
use quote_consensus::api::rest::{AppState, create_router};
use quote_consensus::application::services::{
    QuoteAggregationEngine, QuoteService, RetryingFetcher, spawn_persistence_worker,
};
use quote_consensus::config::AppConfig;
use quote_consensus::infrastructure::persistence::sqlite::SqliteQuoteStore;
use quote_consensus::infrastructure::sources::{HttpClient, SourceRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

/// Time allowed for queued quotes to be written after shutdown.
const PERSISTENCE_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "quote-consensus")]
#[command(about = "Multi-source exchange-rate quotes with consensus averages", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    config.logging.init();

    info!(
        region = %config.region,
        cache_ttl_secs = config.cache.ttl_secs,
        database = %config.database.url,
        "starting quote consensus"
    );

    let store = SqliteQuoteStore::connect(&config.database.url)
        .await
        .context("Failed to connect to quote database")?;
    store
        .migrate()
        .await
        .context("Failed to run database migrations")?;
    let store = Arc::new(store);

    let (persistence, worker) = spawn_persistence_worker(store.clone(), config.database.queue_capacity);

    let client = HttpClient::new(config.fetch.timeout_ms, &config.fetch.user_agent)
        .context("Failed to build HTTP client")?;
    let registry = SourceRegistry::reference(&client).context("Failed to build source registry")?;
    if !registry.has_sources(config.region) {
        anyhow::bail!("no quote sources configured for region {}", config.region);
    }

    let engine = QuoteAggregationEngine::new(
        Arc::new(registry),
        RetryingFetcher::new(config.fetch.retry_policy()),
    );
    let service = Arc::new(QuoteService::new(
        engine,
        store,
        persistence,
        config.region,
        config.cache.ttl(),
    ));

    let router = create_router(Arc::new(AppState::new(service)));
    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(%address, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // The router owned the last queue handle; the worker stops once drained.
    match tokio::time::timeout(PERSISTENCE_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => info!("persistence worker drained"),
        Ok(Err(e)) => error!(error = %e, "persistence worker failed"),
        Err(_) => warn!("persistence worker did not drain in time"),
    }

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
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
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Ctrl+C received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }
}
