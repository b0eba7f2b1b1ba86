// =============================================================================
// Central Application State — TradePilot Engine
// =============================================================================
//
// Everything here is read-only after startup: the configuration, the engine
// with its analyzer registry, the bar-series builder and the upstream market
// data clients.  Request handlers share one `Arc<AppState>`; no locks are needed.
// =============================================================================

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::AnalysisEngine;
use crate::market_data::{BarSeriesBuilder, CandleSource, MarketDataApi};

pub struct AppState {
    // ── Configuration ───────────────────────────────────────────────────
    pub config: EngineConfig,

    // ── Analysis ────────────────────────────────────────────────────────
    pub engine: AnalysisEngine,
    pub builder: BarSeriesBuilder,

    // ── Market Data ─────────────────────────────────────────────────────
    pub source: Arc<dyn CandleSource>,
    pub market: Arc<dyn MarketDataApi>,
}

impl AppState {
    /// Construct the state from `config`, the candle `source` and the
    /// reference-data client. The returned value is typically wrapped in
    /// `Arc` immediately.
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn CandleSource>,
        market: Arc<dyn MarketDataApi>,
    ) -> Self {
        Self {
            engine: AnalysisEngine::new(&config),
            builder: BarSeriesBuilder::new(config.min_bars),
            source,
            market,
            config,
        }
    }

    /// Bars requested when the caller does not pass `limit`.
    pub fn default_limit(&self) -> u32 {
        self.config.polygon.default_limit
    }
}
