// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Analysis endpoints live under `/engine/`. Each request validates its
// parameters, fetches a fresh bar history from the candle source, and runs the
// engine on the blocking pool so CPU-bound work never stalls the async runtime.
// Market-data passthrough routes are merged in from `api::market`.
//
// Every analysis payload passes through `to_clean_json` before it is written,
// so non-finite numbers reach clients as `null`.
//
// CORS is permissive: any origin, method and header.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::{market, validate};
use crate::app_state::AppState;
use crate::layers::LayerId;
use crate::market_data::{Bar, BarSeries};
use crate::sanitize::to_clean_json;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Service ─────────────────────────────────────────────────
        .route("/", get(root))
        .route("/engine/health", get(health))
        .route("/engine/layers", get(list_layers))
        // ── Analysis ────────────────────────────────────────────────
        .route("/engine/analyze", get(analyze))
        .route("/engine/signal-summary", get(signal_summary))
        .route("/engine/layer/:layer_name", get(single_layer))
        // ── Market data ─────────────────────────────────────────────
        .merge(market::routes())
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Query parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct AnalysisQuery {
    pub(crate) symbol: String,
    #[serde(default = "default_timeframe")]
    pub(crate) tf: String,
    #[serde(default)]
    pub(crate) limit: Option<u32>,
}

fn default_timeframe() -> String {
    "day".to_string()
}

/// Validated candle request parameters.
pub(crate) struct CandleRequest {
    pub(crate) symbol: String,
    pub(crate) timeframe: String,
    pub(crate) limit: u32,
}

impl CandleRequest {
    pub(crate) fn from_query(state: &AppState, query: AnalysisQuery) -> Result<Self, ApiError> {
        Ok(Self {
            symbol: validate::ticker(&query.symbol)?,
            timeframe: validate::timespan(&query.tf)?,
            limit: validate::bar_limit(query.limit.unwrap_or_else(|| state.default_limit()))?,
        })
    }

    pub(crate) async fn fetch(&self, state: &AppState) -> Result<Vec<Bar>, ApiError> {
        info!(symbol = %self.symbol, timeframe = %self.timeframe, limit = self.limit, "fetching candles");
        state
            .source
            .get_candles(&self.symbol, &self.timeframe, self.limit)
            .await
            .map_err(ApiError::Upstream)
    }
}

/// A validated request ready for the engine.
struct Prepared {
    symbol: String,
    timeframe: String,
    series: BarSeries,
}

/// Validate `query`, then fetch and validate the bar history it names.
async fn prepare(state: &AppState, query: AnalysisQuery) -> Result<Prepared, ApiError> {
    let req = CandleRequest::from_query(state, query)?;
    let bars = req.fetch(state).await?;
    let series = state.builder.build(bars, &req.symbol, &req.timeframe)?;
    Ok(Prepared {
        symbol: req.symbol,
        timeframe: req.timeframe,
        series,
    })
}

/// Run `job` on the blocking pool.
async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::Internal(format!("analysis task failed: {e}")))
}

// =============================================================================
// Service endpoints
// =============================================================================

async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "TradePilot MCP Server v2.0",
        "status": "running",
        "engine": "10-layer technical analysis system",
        "engine_health": "/engine/health",
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let available: Vec<&'static str> = state.engine.layer_ids().into_iter().map(LayerId::name).collect();
    Json(json!({
        "status": "healthy",
        "engine": "TradePilot v2.0",
        "layers": available.len(),
        "available_layers": available,
    }))
}

async fn list_layers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let layers: Vec<Value> = state
        .engine
        .layer_ids()
        .into_iter()
        .map(|id| json!({ "name": id.name(), "description": id.description() }))
        .collect();
    Json(json!({
        "total_layers": layers.len(),
        "layers": layers,
    }))
}

// =============================================================================
// Analysis endpoints
// =============================================================================

async fn analyze(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<Value>, ApiError> {
    let req = prepare(&state, query).await?;
    let shared = Arc::clone(&state);
    let result = run_blocking(move || {
        shared.engine.analyze(&req.series, &req.symbol, &req.timeframe)
    })
    .await?;
    Ok(Json(to_clean_json(&result)?))
}

async fn signal_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<Value>, ApiError> {
    let req = prepare(&state, query).await?;
    let shared = Arc::clone(&state);
    let summary = run_blocking(move || {
        shared.engine.summary(&req.series, &req.symbol, &req.timeframe)
    })
    .await?;
    Ok(Json(to_clean_json(&summary)?))
}

async fn single_layer(
    State(state): State<Arc<AppState>>,
    Path(layer_name): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<Value>, ApiError> {
    // Reject unknown names before spending an upstream request.
    let layer: LayerId = layer_name.parse()?;

    let req = prepare(&state, query).await?;
    let shared = Arc::clone(&state);
    let projection = run_blocking(move || {
        shared.engine.layer(&req.series, &req.symbol, &req.timeframe, layer)
    })
    .await?;
    Ok(Json(to_clean_json(&projection)?))
}
