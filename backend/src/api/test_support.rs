//! Stub upstream for router tests.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::api::rest::router;
use crate::app_state::AppState;
use crate::config::EngineConfig;
use crate::market_data::{Bar, CandleSource, MarketDataApi};

/// Serves fixed bars and a fixed JSON reply, recording every request.
#[derive(Default)]
pub struct StubSource {
    pub bars: Vec<Bar>,
    pub reply: Value,
    pub fail: bool,
    pub candles_seen: Mutex<Option<(String, String, u32)>>,
    pub json_seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl StubSource {
    pub fn with_bars(bars: Vec<Bar>) -> Arc<Self> {
        Arc::new(Self { bars, ..Self::default() })
    }

    pub fn with_reply(reply: Value) -> Arc<Self> {
        Arc::new(Self { reply, ..Self::default() })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, ..Self::default() })
    }

    pub fn last_path(&self) -> Option<String> {
        self.json_seen.lock().unwrap().last().map(|(p, _)| p.clone())
    }

    pub fn last_param(&self, key: &str) -> Option<String> {
        let seen = self.json_seen.lock().unwrap();
        let (_, params) = seen.last()?;
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    pub fn untouched(&self) -> bool {
        self.candles_seen.lock().unwrap().is_none() && self.json_seen.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl CandleSource for StubSource {
    async fn get_candles(&self, symbol: &str, timeframe: &str, limit: u32) -> Result<Vec<Bar>> {
        *self.candles_seen.lock().unwrap() = Some((symbol.to_string(), timeframe.to_string(), limit));
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(self.bars.clone())
    }
}

#[async_trait]
impl MarketDataApi for StubSource {
    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let params = params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        self.json_seen.lock().unwrap().push((path.to_string(), params));
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(self.reply.clone())
    }
}

pub fn app(source: Arc<StubSource>) -> Router {
    router(Arc::new(AppState::new(
        EngineConfig::default(),
        source.clone(),
        source,
    )))
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
