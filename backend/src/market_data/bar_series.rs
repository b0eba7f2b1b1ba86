// =============================================================================
// Bar Series — immutable, strictly ordered OHLCV history
// =============================================================================
//
// `BarSeriesBuilder` turns raw upstream records into a `BarSeries`:
//   1. drop records with non-finite prices or volume,
//   2. sort by timestamp,
//   3. collapse duplicate timestamps (the later record wins),
//   4. enforce the minimum bar count.
//
// A `BarSeries` can only be obtained through `BarSeries::new`, which re-checks
// ordering and finiteness, so the analysis core can rely on both.
// =============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// A single OHLCV observation. `timestamp` is Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Errors raised while building a bar series. The analysis core itself never
/// fails; these are surfaced before it is invoked.
#[derive(Debug, Error)]
pub enum BarSeriesError {
    #[error("Insufficient or invalid data: {bars_received} bars for {symbol} ({timeframe}), need {min_bars}")]
    InsufficientData {
        symbol: String,
        timeframe: String,
        bars_received: usize,
        min_bars: usize,
    },

    #[error("bar {index} is not strictly after its predecessor")]
    OutOfOrder { index: usize },

    #[error("bar {index} has a non-finite price or volume")]
    NonFinite { index: usize },
}

/// Immutable bar history, oldest first, timestamps strictly increasing.
#[derive(Debug, Clone)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and wrap `bars`.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarSeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_finite() {
                return Err(BarSeriesError::NonFinite { index });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(BarSeriesError::OutOfOrder { index });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

/// Builds validated [`BarSeries`] values from raw records.
#[derive(Debug, Clone, Copy)]
pub struct BarSeriesBuilder {
    min_bars: usize,
}

impl BarSeriesBuilder {
    pub fn new(min_bars: usize) -> Self {
        Self { min_bars }
    }

    /// Order, deduplicate and validate `records` for `symbol`/`timeframe`.
    pub fn build(
        &self,
        records: impl IntoIterator<Item = Bar>,
        symbol: &str,
        timeframe: &str,
    ) -> Result<BarSeries, BarSeriesError> {
        let raw: Vec<Bar> = records.into_iter().collect();
        let received = raw.len();

        let mut bars: Vec<Bar> = raw.into_iter().filter(Bar::is_finite).collect();
        let dropped = received - bars.len();
        if dropped > 0 {
            warn!(symbol, timeframe, dropped, "dropped bars with non-finite values");
        }

        // Stable sort keeps arrival order among equal timestamps, so the
        // last record seen for a timestamp is the one that survives.
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => deduped.push(bar),
            }
        }

        if deduped.len() < self.min_bars {
            return Err(BarSeriesError::InsufficientData {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
                bars_received: deduped.len(),
                min_bars: self.min_bars,
            });
        }

        debug!(symbol, timeframe, received, bars = deduped.len(), "bar series built");
        BarSeries::new(deduped)
    }
}

impl Default for BarSeriesBuilder {
    fn default() -> Self {
        Self::new(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar::new(ts, close, close + 1.0, close - 1.0, close, 100.0)
    }

    #[test]
    fn builder_sorts_and_dedups_last_wins() {
        let records = vec![bar(3, 30.0), bar(1, 10.0), bar(2, 20.0), bar(2, 21.0)];
        let series = BarSeriesBuilder::new(1).build(records, "AAPL", "day").unwrap();
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.0, 21.0, 30.0]);
    }

    #[test]
    fn builder_rejects_short_series() {
        let records: Vec<Bar> = (0..10).map(|i| bar(i, 1.0)).collect();
        let err = BarSeriesBuilder::new(200).build(records, "AAPL", "day").unwrap_err();
        match err {
            BarSeriesError::InsufficientData { bars_received, symbol, timeframe, min_bars } => {
                assert_eq!(bars_received, 10);
                assert_eq!(symbol, "AAPL");
                assert_eq!(timeframe, "day");
                assert_eq!(min_bars, 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn builder_rejects_empty_series() {
        assert!(BarSeriesBuilder::default().build(Vec::new(), "X", "day").is_err());
    }

    #[test]
    fn builder_drops_non_finite_records() {
        let mut records = vec![bar(1, 1.0), bar(2, 2.0)];
        records.push(Bar::new(3, f64::NAN, 1.0, 1.0, 1.0, 1.0));
        let series = BarSeriesBuilder::new(2).build(records, "X", "day").unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn new_rejects_out_of_order() {
        let err = BarSeries::new(vec![bar(2, 1.0), bar(1, 1.0)]).unwrap_err();
        assert!(matches!(err, BarSeriesError::OutOfOrder { index: 1 }));
        let err = BarSeries::new(vec![bar(1, 1.0), bar(1, 1.0)]).unwrap_err();
        assert!(matches!(err, BarSeriesError::OutOfOrder { index: 1 }));
    }

    #[test]
    fn new_rejects_non_finite() {
        let err = BarSeries::new(vec![Bar::new(1, 1.0, f64::INFINITY, 1.0, 1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, BarSeriesError::NonFinite { index: 0 }));
    }
}
