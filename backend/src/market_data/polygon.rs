// =============================================================================
// Polygon.io REST Client
// =============================================================================
//
// Fetches OHLCV aggregates from `/v2/aggs/ticker/{symbol}/range/1/{tf}/...`.
// The look-back window spans `limit` calendar days ending today, and the same
// `limit` caps the number of returned aggregates.
//
// Reference, snapshot and options data go through `fetch_json`, which backs
// the `MarketDataApi` trait.
//
// SECURITY: the API key travels as a query parameter (Polygon's convention).
// It is never logged, and request URLs are stripped from transport errors
// before they are wrapped, so the key cannot reach error messages.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::bar_series::Bar;
use super::reference::MarketDataApi;
use crate::config::PolygonConfig;

/// Aggregate timespans Polygon accepts in the range path.
pub const TIMESPANS: [&str; 7] = ["minute", "hour", "day", "week", "month", "quarter", "year"];

/// Largest number of aggregates Polygon returns for one range request.
pub const MAX_AGGREGATES: u32 = 50_000;

pub fn is_timespan(value: &str) -> bool {
    TIMESPANS.contains(&value)
}

/// One aggregate record as returned by Polygon.
#[derive(Debug, Clone, Deserialize)]
pub struct Aggregate {
    #[serde(rename = "t")]
    pub timestamp: i64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
}

impl From<Aggregate> for Bar {
    fn from(a: Aggregate) -> Self {
        Bar::new(a.timestamp, a.open, a.high, a.low, a.close, a.volume)
    }
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    results: Vec<Aggregate>,
}

/// Anything that can supply raw bars for a symbol/timeframe.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn get_candles(&self, symbol: &str, timeframe: &str, limit: u32) -> Result<Vec<Bar>>;
}

/// `[end - limit days, end]`. Errors instead of overflowing the calendar.
pub fn lookback_window(end: NaiveDate, limit: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = end
        .checked_sub_days(Days::new(u64::from(limit)))
        .with_context(|| format!("look-back of {limit} days is out of range"))?;
    Ok((start, end))
}

/// Polygon.io REST client.
#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl PolygonClient {
    pub fn new(config: &PolygonConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %config.base_url, "PolygonClient initialised");

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// GET `{base_url}{path}` with `params` plus the API key. Non-success
    /// statuses become errors carrying the status and the response body.
    #[instrument(skip(self, params), name = "polygon::fetch_json")]
    pub async fn fetch_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("GET {path} request failed"))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("failed to parse {path} response"))?;

        if !status.is_success() {
            anyhow::bail!("Polygon GET {} returned {}: {}", path, status, body);
        }
        Ok(body)
    }

    /// GET /v2/aggs/ticker/{symbol}/range/1/{timeframe}/{start}/{end}.
    #[instrument(skip(self), name = "polygon::get_aggregates")]
    pub async fn get_aggregates(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> Result<Vec<Aggregate>> {
        let (start_date, end_date) = lookback_window(Utc::now().date_naive(), limit)?;
        let path = format!("/v2/aggs/ticker/{symbol}/range/1/{timeframe}/{start_date}/{end_date}");

        let body = self.fetch_json(&path, &[("limit", limit.to_string())]).await?;
        let parsed: AggregatesResponse =
            serde_json::from_value(body).context("unexpected aggregates payload")?;

        debug!(symbol, timeframe, count = parsed.results.len(), "aggregates fetched");
        Ok(parsed.results)
    }
}

#[async_trait]
impl CandleSource for PolygonClient {
    async fn get_candles(&self, symbol: &str, timeframe: &str, limit: u32) -> Result<Vec<Bar>> {
        let aggregates = self.get_aggregates(symbol, timeframe, limit).await?;
        Ok(aggregates.into_iter().map(Bar::from).collect())
    }
}

#[async_trait]
impl MarketDataApi for PolygonClient {
    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        self.fetch_json(path, params).await
    }
}

impl std::fmt::Debug for PolygonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
