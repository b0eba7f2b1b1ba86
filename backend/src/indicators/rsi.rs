// =============================================================================
// Relative Strength Index (RSI) — simple rolling averages
// =============================================================================
//
// Step 1 — Close-to-close deltas (the first bar contributes a zero delta).
// Step 2 — Split into gains and losses (both non-negative).
// Step 3 — Average gain / average loss are *simple* rolling means over
//          `period` bars (no Wilder smoothing).
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// When the average loss is zero the RSI saturates to 100.
// =============================================================================

use super::ma::rolling_mean;
use super::Series;

/// Compute the bar-aligned RSI series for `closes`.
///
/// The first defined value sits at index `period - 1`.
pub fn rsi(closes: &[f64], period: usize) -> Series {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());

    for (i, &close) in closes.iter().enumerate() {
        let delta = if i == 0 { 0.0 } else { close - closes[i - 1] };
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| Some(rsi_from_averages((*g)?, (*l)?)))
        .collect()
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
