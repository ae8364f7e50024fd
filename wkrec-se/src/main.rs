//! wkrec-se - Suggested Edits recommendation service
//!
//! Serves article, caption and description suggestions aggregated from the
//! wiki content API, the structured-data API and the ranking store.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wkrec_se::rank::SqliteRankingStore;
use wkrec_se::recommend::Recommender;
use wkrec_se::upstream::HttpWikiApi;
use wkrec_se::AppState;

const MODULE_NAME: &str = "wkrec-se";

/// Command-line arguments for wkrec-se
#[derive(Parser, Debug)]
#[command(name = "wkrec-se")]
#[command(about = "Suggested edits recommendation service")]
#[command(version)]
struct Args {
    /// Config file (overrides WKREC_CONFIG and the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config and WKREC_BIND)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wkrec_se=info,wkrec_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{} [{}] built {} ({})",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut config = wkrec_common::config::load_config(args.config.as_deref(), MODULE_NAME)
        .context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    let pool = wkrec_se::db::connect_readonly(&config.store.database_url, config.store.max_connections).await?;
    let store = Arc::new(SqliteRankingStore::new(pool));

    let api = Arc::new(HttpWikiApi::new(&config.upstream).context("Failed to build upstream client")?);
    info!(
        meta = %config.upstream.meta_domain,
        structured_data = %config.upstream.structured_data_domain,
        "Upstream client ready"
    );

    let recommender = Recommender::new(api, store, &config);
    let bind_addr = config.server.bind_addr.clone();
    let app = wkrec_se::build_router(AppState::new(recommender, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
