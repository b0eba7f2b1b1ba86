// =============================================================================
// Request parameter validation
// =============================================================================
//
// Tickers and timespans end up as Polygon URL path segments, so they are
// restricted to a safe alphabet before any upstream call is made.
// =============================================================================

use chrono::NaiveDate;

use crate::api::error::ApiError;
use crate::market_data::polygon::{is_timespan, MAX_AGGREGATES, TIMESPANS};

const MAX_TICKER_LEN: usize = 64;

/// Upper-cased ticker limited to `[A-Z0-9.:-]`.
pub fn ticker(raw: &str) -> Result<String, ApiError> {
    let symbol = raw.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= MAX_TICKER_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '-'));
    if valid {
        Ok(symbol)
    } else {
        Err(ApiError::InvalidParameter(format!(
            "Invalid ticker '{raw}'. Allowed characters: A-Z 0-9 . : -"
        )))
    }
}

pub fn timespan(raw: &str) -> Result<String, ApiError> {
    let value = raw.trim().to_ascii_lowercase();
    if is_timespan(&value) {
        Ok(value)
    } else {
        Err(ApiError::InvalidParameter(format!(
            "Invalid timeframe '{raw}'. Available: {}",
            TIMESPANS.join(", ")
        )))
    }
}

/// Bar count in `1..=MAX_AGGREGATES`.
pub fn bar_limit(limit: u32) -> Result<u32, ApiError> {
    range("limit", limit, 1, MAX_AGGREGATES)
}

pub fn range(name: &str, value: u32, min: u32, max: u32) -> Result<u32, ApiError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::InvalidParameter(format!(
            "{name} must be between {min} and {max}"
        )))
    }
}

/// `YYYY-MM-DD`.
pub fn date(name: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidParameter(format!("{name} must be a YYYY-MM-DD date")))
}
