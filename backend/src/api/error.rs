// =============================================================================
// API errors — mapped to HTTP status codes with JSON bodies
// =============================================================================
//
//   InsufficientData  400  {error, symbol, timeframe, bars_received}
//   InvalidLayer      400  {detail}
//   InvalidParameter  400  {detail}
//   Rejected          400  upstream body, or {error}
//   Upstream          502  {detail}
//   Internal          500  {detail}
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::layers::UnknownLayer;
use crate::market_data::BarSeriesError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Insufficient or invalid data")]
    InsufficientData {
        symbol: String,
        timeframe: String,
        bars_received: usize,
    },

    #[error(transparent)]
    InvalidLayer(#[from] UnknownLayer),

    #[error("{0}")]
    InvalidParameter(String),

    /// A successful upstream reply the endpoint refuses to serve.
    #[error("rejected upstream payload")]
    Rejected(Value),

    #[error("upstream market data request failed: {0:#}")]
    Upstream(anyhow::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<BarSeriesError> for ApiError {
    fn from(err: BarSeriesError) -> Self {
        match err {
            BarSeriesError::InsufficientData {
                symbol,
                timeframe,
                bars_received,
                ..
            } => Self::InsufficientData {
                symbol,
                timeframe,
                bars_received,
            },
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("failed to serialise response: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::InsufficientData {
                symbol,
                timeframe,
                bars_received,
            } => {
                warn!(%symbol, %timeframe, bars_received, "rejected short bar series");
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": self.to_string(),
                        "symbol": symbol,
                        "timeframe": timeframe,
                        "bars_received": bars_received,
                    }),
                )
            }
            Self::InvalidLayer(e) => {
                (StatusCode::BAD_REQUEST, json!({ "detail": e.to_string() }))
            }
            Self::InvalidParameter(msg) => (StatusCode::BAD_REQUEST, json!({ "detail": msg })),
            Self::Rejected(body) => (StatusCode::BAD_REQUEST, body.clone()),
            Self::Upstream(e) => {
                warn!(error = %format!("{e:#}"), "upstream request failed");
                (StatusCode::BAD_GATEWAY, json!({ "detail": self.to_string() }))
            }
            Self::Internal(msg) => {
                error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "detail": msg }))
            }
        };
        (status, Json(body)).into_response()
    }
}
