// =============================================================================
// Market Data Endpoints — Polygon passthrough
// =============================================================================
//
// Candles come through the `CandleSource`; every other route forwards to a
// `MarketDataApi` method and returns Polygon's JSON unchanged, except the
// options routes, which filter contracts to the expiry horizon first.
//
// Every ticker, timespan and date is validated before the upstream call.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::rest::{AnalysisQuery, CandleRequest};
use crate::api::validate;
use crate::app_state::AppState;
use crate::market_data::expiry::{self, MAX_EXPIRY_DAYS};
use crate::market_data::{ContractType, ExpiryBucket};

type JsonResult = Result<Json<Value>, ApiError>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        // ── Stocks ──────────────────────────────────────────────────
        .route("/candles", get(candles))
        .route("/symbol-lookup", get(symbol_lookup))
        .route("/news", get(news))
        .route("/last-trade", get(last_trade))
        .route("/ticker-details", get(ticker_details))
        .route("/fundamentals", get(fundamentals))
        .route("/previous-day-bar/:ticker", get(previous_day_bar))
        .route("/stock-snapshot/:ticker", get(stock_snapshot))
        // ── Options ─────────────────────────────────────────────────
        .route("/options", get(options))
        .route("/all-option-contracts", get(all_option_contracts))
        .route("/option-aggregates/:options_ticker", get(option_aggregates))
        .route("/option-previous-day-bar/:options_ticker", get(previous_day_bar))
        .route(
            "/option-contract-snapshot/:underlying/:contract",
            get(option_contract_snapshot),
        )
        .route(
            "/option-chain-snapshot/:underlying_asset",
            get(option_chain_snapshot),
        )
}

fn upstream(result: anyhow::Result<Value>) -> JsonResult {
    result.map(Json).map_err(ApiError::Upstream)
}

// =============================================================================
// Stocks
// =============================================================================

#[derive(Debug, Deserialize)]
struct SymbolQuery {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct LookupQuery {
    query: String,
}

async fn candles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> JsonResult {
    let req = CandleRequest::from_query(&state, query)?;
    let bars = req.fetch(&state).await?;
    Ok(Json(json!({
        "symbol": req.symbol,
        "timeframe": req.timeframe,
        "count": bars.len(),
        "results": bars,
    })))
}

async fn symbol_lookup(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LookupQuery>,
) -> JsonResult {
    let search = q.query.trim();
    if search.is_empty() || search.len() > 100 {
        return Err(ApiError::InvalidParameter(
            "query must be 1 to 100 characters".to_string(),
        ));
    }
    upstream(state.market.symbol_lookup(search).await)
}

async fn news(State(state): State<Arc<AppState>>, Query(q): Query<SymbolQuery>) -> JsonResult {
    let symbol = validate::ticker(&q.symbol)?;
    upstream(state.market.news(&symbol).await)
}

async fn last_trade(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolQuery>,
) -> JsonResult {
    let symbol = validate::ticker(&q.symbol)?;
    upstream(state.market.last_trade(&symbol).await)
}

async fn ticker_details(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolQuery>,
) -> JsonResult {
    let symbol = validate::ticker(&q.symbol)?;
    upstream(state.market.ticker_details(&symbol).await)
}

async fn fundamentals(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolQuery>,
) -> JsonResult {
    let symbol = validate::ticker(&q.symbol)?;
    upstream(state.market.fundamentals(&symbol).await)
}

async fn previous_day_bar(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> JsonResult {
    let ticker = validate::ticker(&ticker)?;
    upstream(state.market.previous_day_bar(&ticker).await)
}

async fn stock_snapshot(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> JsonResult {
    let ticker = validate::ticker(&ticker)?;
    upstream(state.market.stock_snapshot(&ticker).await)
}

// =============================================================================
// Options
// =============================================================================

fn default_contract_type() -> String {
    "call".to_string()
}

fn default_days_out() -> u32 {
    30
}

fn default_page_limit() -> u32 {
    50
}

#[derive(Debug, Deserialize)]
struct OptionsQuery {
    symbol: String,
    #[serde(rename = "type", default = "default_contract_type")]
    contract_type: String,
    #[serde(default = "default_days_out")]
    days_out: u32,
    #[serde(default)]
    expiry_bucket: Option<ExpiryBucket>,
}

async fn options(State(state): State<Arc<AppState>>, Query(q): Query<OptionsQuery>) -> JsonResult {
    let symbol = validate::ticker(&q.symbol)?;
    let contract_type = ContractType::parse(&q.contract_type).ok_or_else(|| {
        ApiError::InvalidParameter("type must be 'call' or 'put'".to_string())
    })?;
    let days_out = validate::range("days_out", q.days_out, 0, MAX_EXPIRY_DAYS as u32)?;

    let today = Utc::now().date_naive();
    let mut chain = state
        .market
        .options_chain(&symbol, contract_type, days_out, today)
        .await
        .map_err(ApiError::Upstream)?;
    expiry::filter_results(&mut chain, today, q.expiry_bucket);
    Ok(Json(chain))
}

#[derive(Debug, Deserialize)]
struct ContractsQuery {
    underlying_ticker: String,
    #[serde(default)]
    expiration_date: Option<String>,
    #[serde(default = "default_page_limit")]
    limit: u32,
    #[serde(default)]
    expiry_bucket: Option<ExpiryBucket>,
}

async fn all_option_contracts(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ContractsQuery>,
) -> JsonResult {
    let underlying = validate::ticker(&q.underlying_ticker)?;
    let expiring_from = q
        .expiration_date
        .as_deref()
        .map(|d| validate::date("expiration_date", d))
        .transpose()?;
    let limit = validate::range("limit", q.limit, 1, 1000)?;

    let today = Utc::now().date_naive();
    let mut contracts = state
        .market
        .option_contracts(&underlying, expiring_from, limit)
        .await
        .map_err(ApiError::Upstream)?;
    expiry::filter_results(&mut contracts, today, q.expiry_bucket);
    Ok(Json(contracts))
}

#[derive(Debug, Deserialize)]
struct OptionAggregatesQuery {
    multiplier: u32,
    timespan: String,
    from_date: String,
    to_date: String,
}

async fn option_aggregates(
    State(state): State<Arc<AppState>>,
    Path(options_ticker): Path<String>,
    Query(q): Query<OptionAggregatesQuery>,
) -> JsonResult {
    let ticker = validate::ticker(&options_ticker)?;
    let multiplier = validate::range("multiplier", q.multiplier, 1, 10_000)?;
    let timespan = validate::timespan(&q.timespan)?;
    let from = validate::date("from_date", &q.from_date)?;
    let to = validate::date("to_date", &q.to_date)?;
    upstream(
        state
            .market
            .option_aggregates(&ticker, multiplier, &timespan, from, to)
            .await,
    )
}

async fn option_contract_snapshot(
    State(state): State<Arc<AppState>>,
    Path((underlying, contract)): Path<(String, String)>,
) -> JsonResult {
    let underlying = validate::ticker(&underlying)?;
    let contract = validate::ticker(&contract)?;

    let snapshot = state
        .market
        .option_contract_snapshot(&underlying, &contract)
        .await
        .map_err(ApiError::Upstream)?;

    if snapshot.get("error").is_some() {
        return Err(ApiError::Rejected(snapshot));
    }
    let today = Utc::now().date_naive();
    if let Some(expires) = snapshot.get("results").and_then(expiry::expiration) {
        if !expiry::within_horizon(expires, today) {
            debug!(%contract, %expires, "contract outside expiry horizon");
            return Err(ApiError::Rejected(
                json!({ "error": "Expired or too far contract" }),
            ));
        }
    }
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
struct ChainSnapshotQuery {
    #[serde(default)]
    expiry_bucket: Option<ExpiryBucket>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default = "default_page_limit")]
    limit: u32,
}

async fn option_chain_snapshot(
    State(state): State<Arc<AppState>>,
    Path(underlying_asset): Path<String>,
    Query(q): Query<ChainSnapshotQuery>,
) -> JsonResult {
    let underlying = validate::ticker(&underlying_asset)?;
    let limit = validate::range("limit", q.limit, 1, 250)?;

    let today = Utc::now().date_naive();
    let mut chain = state
        .market
        .option_chain_snapshot(&underlying, q.cursor.as_deref(), limit)
        .await
        .map_err(ApiError::Upstream)?;
    expiry::filter_results(&mut chain, today, q.expiry_bucket);
    Ok(Json(chain))
}
