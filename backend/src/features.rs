// =============================================================================
// Feature Frame — shared per-bar quantities derived once per analysis
// =============================================================================
//
// Column layout (index `i` always belongs to bar `i`):
//
//   open/high/low/close/volume   raw OHLCV columns
//   true_range    max(H - L, |H - prevC|, |L - prevC|), undefined on bar 0
//   body_size     |C - O|
//   upper_wick    H - max(C, O)
//   lower_wick    min(C, O) - L
//   body_percent  body_size / (H - L), 0 when the range is 0
//   is_bullish    C > O
//
// The frame is computed from the immutable `BarSeries`; layers read columns and keep
// any further working columns private.
// =============================================================================

use crate::indicators::{atr, Series};
use crate::market_data::BarSeries;

#[derive(Debug, Clone)]
pub struct FeatureFrame {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub true_range: Series,
    pub body_size: Vec<f64>,
    pub upper_wick: Vec<f64>,
    pub lower_wick: Vec<f64>,
    pub body_percent: Vec<f64>,
    pub is_bullish: Vec<bool>,
}

impl FeatureFrame {
    /// Derive every shared column from `series`. Never fails; an empty series
    /// yields empty columns.
    pub fn derive(series: &BarSeries) -> Self {
        let bars = series.bars();
        let n = bars.len();

        let open: Vec<f64> = bars.iter().map(|b| b.open).collect();
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volume: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let true_range = atr::true_range(&high, &low, &close);

        let mut body_size = Vec::with_capacity(n);
        let mut upper_wick = Vec::with_capacity(n);
        let mut lower_wick = Vec::with_capacity(n);
        let mut body_percent = Vec::with_capacity(n);

        for b in bars {
            let body = (b.close - b.open).abs();
            let range = b.high - b.low;
            body_size.push(body);
            upper_wick.push(b.high - b.close.max(b.open));
            lower_wick.push(b.close.min(b.open) - b.low);
            body_percent.push(if range > 0.0 { body / range } else { 0.0 });
        }

        let is_bullish = bars.iter().map(|b| b.close > b.open).collect();

        Self {
            open,
            high,
            low,
            close,
            volume,
            true_range,
            body_size,
            upper_wick,
            lower_wick,
            body_percent,
            is_bullish,
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }
}
