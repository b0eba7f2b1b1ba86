// =============================================================================
// Average True Range (ATR) — simple rolling mean
// =============================================================================
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// The first bar has no previous close, so its TR is undefined and ATR becomes
// defined one bar after the first full window.
// =============================================================================

use super::ma::rolling_mean;
use super::{finite, safe_div, Series};

/// Bar-aligned true range.
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Series {
    (0..closes.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            let prev_close = closes[i - 1];
            let hl = highs[i] - lows[i];
            let hc = (highs[i] - prev_close).abs();
            let lc = (lows[i] - prev_close).abs();
            finite(hl.max(hc).max(lc))
        })
        .collect()
}

/// ATR as the simple rolling mean of `true_range`.
pub fn atr(true_range: &[Option<f64>], period: usize) -> Series {
    rolling_mean(true_range, period)
}

/// ATR as a percentage of each bar's close.
pub fn atr_pct(true_range: &[Option<f64>], closes: &[f64], period: usize) -> Series {
    atr(true_range, period)
        .iter()
        .zip(closes.iter())
        .map(|(a, &close)| safe_div((*a)? * 100.0, close))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_bar_has_no_true_range() {
        let tr = true_range(&[10.0, 11.0], &[9.0, 10.0], &[9.5, 10.5]);
        assert_eq!(tr[0], None);
        assert_eq!(tr[1], Some(1.5));
    }

    #[test]
    fn true_range_uses_prev_close_on_gap() {
        let tr = true_range(&[105.0, 115.0], &[95.0, 108.0], &[95.0, 112.0]);
        assert_eq!(tr[1], Some(20.0));
    }

    #[test]
    fn atr_constant_range() {
        let n = 30;
        let closes: Vec<f64> = vec![100.0; n];
        let highs: Vec<f64> = vec![105.0; n];
        let lows: Vec<f64> = vec![95.0; n];
        let tr = true_range(&highs, &lows, &closes);
        let a = atr(&tr, 14);
        assert!(a[13].is_none());
        assert_eq!(a[14], Some(10.0));
        let pct = atr_pct(&tr, &closes, 14);
        assert_eq!(pct[n - 1], Some(10.0));
    }

    #[test]
    fn atr_pct_zero_close_is_undefined() {
        let tr = vec![None, Some(1.0), Some(1.0)];
        let pct = atr_pct(&tr, &[0.0, 0.0, 0.0], 2);
        assert!(pct.iter().all(Option::is_none));
    }
}
