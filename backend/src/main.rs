// =============================================================================
// TradePilot Engine — Main Entry Point
// =============================================================================
//
// Loads configuration, connects the Polygon candle source and serves the
// 10-layer analysis API until Ctrl-C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod config;
mod engine;
mod features;
mod indicators;
mod layers;
mod market_data;
mod sanitize;
mod signals;
mod types;

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::EngineConfig;
use crate::market_data::PolygonClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        TradePilot Engine v2.0 — Starting Up              ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = EngineConfig::load("tradepilot_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });
    config.apply_env_overrides();

    if config.polygon.api_key.is_empty() {
        warn!("POLYGON_API_KEY is not set; upstream requests will be rejected");
    }

    info!(
        min_bars = config.min_bars,
        default_limit = config.polygon.default_limit,
        base_url = %config.polygon.base_url,
        "Configuration ready"
    );

    // ── 2. Candle source & shared state ──────────────────────────────────
    let polygon = Arc::new(PolygonClient::new(&config.polygon)?);
    let bind_addr = config.server.bind_addr.clone();
    let state = Arc::new(AppState::new(config, polygon.clone(), polygon));
    info!(layers = state.engine.layer_ids().len(), "Analysis engine initialised");

    // ── 3. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("TradePilot Engine shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
