// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free rolling-window primitives shared by the analysis
// layers.  Every series is aligned with the bar series it was computed from
// (index `i` belongs to bar `i`) and uses `None` for bars where the look-back
// window is not yet filled or the arithmetic is undefined (zero divisors,
// non-finite intermediates).  Callers never have to handle a failure, only an
// indeterminate value.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod flow;
pub mod ichimoku;
pub mod ma;
pub mod macd;
pub mod percentile;
pub mod rsi;
pub mod slope;
pub mod stochastic;

/// A bar-aligned indicator series. `None` marks an indeterminate value.
pub type Series = Vec<Option<f64>>;

/// Lift a plain column into a fully-defined series.
pub fn lift(values: &[f64]) -> Series {
    values.iter().map(|v| finite(*v)).collect()
}

/// `Some(value)` when finite, otherwise `None`.
pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Division that yields `None` instead of NaN or infinity.
pub fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}

/// Most recent value of a series, flattened.
pub fn last(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Value `offset` bars before the most recent one (`offset == 0` is the last).
pub fn nth_back(series: &[Option<f64>], offset: usize) -> Option<f64> {
    let idx = series.len().checked_sub(offset + 1)?;
    series[idx]
}

/// Round half away from zero to `dp` decimal places.
pub fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

/// [`round_to`] for optional values; non-finite values collapse to `None`.
pub fn round_opt(value: Option<f64>, dp: i32) -> Option<f64> {
    value.and_then(finite).map(|v| round_to(v, dp))
}
