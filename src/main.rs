// =============================================================================
// Aurora Analyst - Main Entry Point
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aurora_analyst::api;
use aurora_analyst::app_state::AppState;
use aurora_analyst::binance::BinanceClient;
use aurora_analyst::runtime_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Aurora Analyst starting up");

    let config = AppConfig::from_env();
    info!(
        spot = %config.binance_api,
        futures = %config.binance_fapi,
        benchmarks = ?config.benchmarks,
        "configuration resolved"
    );

    // ── 2. Market-data source ────────────────────────────────────────────
    let client = BinanceClient::new(config.binance_api.as_str(), config.binance_fapi.as_str())?;

    // ── 3. Shared state & API server ─────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Arc::new(client)));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Aurora Analyst shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, stopping gracefully");
}
