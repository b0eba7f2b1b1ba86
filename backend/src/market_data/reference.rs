// =============================================================================
// Market Reference Data — Polygon passthrough endpoints
// =============================================================================
//
// `MarketDataApi` has one required method, `get_json`, and builds every
// reference, snapshot and options request on top of it. Path segments are
// interpolated as given, so callers validate tickers before calling.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde_json::Value;

/// Contract side for options chain queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractType {
    Call,
    Put,
}

impl ContractType {
    /// Case-insensitive `call` / `put`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "call" => Some(Self::Call),
            "put" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// GET `path` with `params`; credentials are added by the implementation.
    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value>;

    async fn symbol_lookup(&self, query: &str) -> Result<Value> {
        self.get_json(
            "/v3/reference/tickers",
            &[("search", query.to_string()), ("active", "true".to_string())],
        )
        .await
    }

    async fn news(&self, symbol: &str) -> Result<Value> {
        self.get_json(
            "/v2/reference/news",
            &[("ticker", symbol.to_string()), ("limit", "5".to_string())],
        )
        .await
    }

    async fn last_trade(&self, symbol: &str) -> Result<Value> {
        self.get_json(&format!("/v2/last/trade/{symbol}"), &[]).await
    }

    async fn ticker_details(&self, symbol: &str) -> Result<Value> {
        self.get_json(&format!("/v3/reference/tickers/{symbol}"), &[]).await
    }

    /// Latest quarterly financials.
    async fn fundamentals(&self, symbol: &str) -> Result<Value> {
        self.get_json(
            "/v2/reference/financials",
            &[("ticker", symbol.to_string()), ("limit", "1".to_string())],
        )
        .await
    }

    /// Previous session bar; works for stock and option tickers alike.
    async fn previous_day_bar(&self, ticker: &str) -> Result<Value> {
        self.get_json(&format!("/v2/aggs/ticker/{ticker}/prev"), &[]).await
    }

    async fn stock_snapshot(&self, ticker: &str) -> Result<Value> {
        self.get_json(
            &format!("/v2/snapshot/locale/us/markets/stocks/tickers/{ticker}"),
            &[],
        )
        .await
    }

    /// Contracts of one side expiring within `days_out` days of `today`.
    async fn options_chain(
        &self,
        symbol: &str,
        contract_type: ContractType,
        days_out: u32,
        today: NaiveDate,
    ) -> Result<Value> {
        let target = today
            .checked_add_days(Days::new(u64::from(days_out)))
            .with_context(|| format!("days_out of {days_out} is out of range"))?;
        self.get_json(
            "/v3/reference/options/contracts",
            &[
                ("underlying_ticker", symbol.to_string()),
                ("contract_type", contract_type.as_str().to_string()),
                ("expiration_date.gte", today.to_string()),
                ("expiration_date.lte", target.to_string()),
                ("limit", "100".to_string()),
            ],
        )
        .await
    }

    async fn option_contracts(
        &self,
        underlying: &str,
        expiring_from: Option<NaiveDate>,
        limit: u32,
    ) -> Result<Value> {
        let mut params = vec![
            ("underlying_ticker", underlying.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(date) = expiring_from {
            params.push(("expiration_date.gte", date.to_string()));
        }
        self.get_json("/v3/reference/options/contracts", &params).await
    }

    async fn option_aggregates(
        &self,
        options_ticker: &str,
        multiplier: u32,
        timespan: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Value> {
        self.get_json(
            &format!("/v2/aggs/ticker/{options_ticker}/range/{multiplier}/{timespan}/{from}/{to}"),
            &[],
        )
        .await
    }

    async fn option_chain_snapshot(
        &self,
        underlying: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Value> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        self.get_json(&format!("/v3/snapshot/options/{underlying}"), &params)
            .await
    }

    async fn option_contract_snapshot(&self, underlying: &str, contract: &str) -> Result<Value> {
        self.get_json(&format!("/v3/snapshot/options/{underlying}/{contract}"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    #[async_trait]
    impl MarketDataApi for Recorder {
        async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
            let params = params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
            self.calls.lock().unwrap().push((path.to_string(), params));
            Ok(Value::Null)
        }
    }

    impl Recorder {
        fn last(&self) -> (String, Vec<(String, String)>) {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn contract_type_parse() {
        assert_eq!(ContractType::parse("CALL"), Some(ContractType::Call));
        assert_eq!(ContractType::parse(" put "), Some(ContractType::Put));
        assert_eq!(ContractType::parse("straddle"), None);
    }

    #[tokio::test]
    async fn stock_paths() {
        let api = Recorder::default();

        api.last_trade("AAPL").await.unwrap();
        assert_eq!(api.last().0, "/v2/last/trade/AAPL");

        api.previous_day_bar("O:AAPL250117C00150000").await.unwrap();
        assert_eq!(api.last().0, "/v2/aggs/ticker/O:AAPL250117C00150000/prev");

        api.stock_snapshot("MSFT").await.unwrap();
        assert_eq!(api.last().0, "/v2/snapshot/locale/us/markets/stocks/tickers/MSFT");

        api.news("TSLA").await.unwrap();
        let (path, params) = api.last();
        assert_eq!(path, "/v2/reference/news");
        assert_eq!(param(&params, "ticker"), Some("TSLA"));
        assert_eq!(param(&params, "limit"), Some("5"));
    }

    #[tokio::test]
    async fn options_chain_window() {
        let api = Recorder::default();
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        api.options_chain("SPY", ContractType::Put, 30, today).await.unwrap();

        let (path, params) = api.last();
        assert_eq!(path, "/v3/reference/options/contracts");
        assert_eq!(param(&params, "contract_type"), Some("put"));
        assert_eq!(param(&params, "expiration_date.gte"), Some("2025-01-10"));
        assert_eq!(param(&params, "expiration_date.lte"), Some("2025-02-09"));
    }

    #[tokio::test]
    async fn options_chain_overflow_is_an_error() {
        let api = Recorder::default();
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert!(api.options_chain("SPY", ContractType::Call, u32::MAX, today).await.is_err());
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn optional_params_are_omitted() {
        let api = Recorder::default();
        api.option_chain_snapshot("SPY", None, 50).await.unwrap();
        assert_eq!(param(&api.last().1, "cursor"), None);

        api.option_chain_snapshot("SPY", Some("abc"), 50).await.unwrap();
        assert_eq!(param(&api.last().1, "cursor"), Some("abc"));

        api.option_contracts("SPY", None, 50).await.unwrap();
        assert_eq!(param(&api.last().1, "expiration_date.gte"), None);
    }
}
