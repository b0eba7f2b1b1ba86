// =============================================================================
// Stochastic Oscillator (double-smoothed)
// =============================================================================
//
//   raw %K = 100 * (close - lowest_low) / (highest_high - lowest_low)
//   %K     = SMA(smooth) of raw %K
//   %D     = SMA(smooth) of %K
//
// A zero high/low range leaves raw %K undefined for that bar.
// =============================================================================

use super::ma::{rolling_max, rolling_mean, rolling_min};
use super::{lift, safe_div, Series};

#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Series,
    pub d: Series,
}

pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    length: usize,
    smooth: usize,
) -> StochasticSeries {
    let highest = rolling_max(&lift(highs), length);
    let lowest = rolling_min(&lift(lows), length);

    let raw_k: Series = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let (hh, ll) = (highest[i]?, lowest[i]?);
            safe_div(100.0 * (close - ll), hh - ll)
        })
        .collect();

    let k = rolling_mean(&raw_k, smooth);
    let d = rolling_mean(&k, smooth);
    StochasticSeries { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oscillating(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.5).sin() * 10.0).collect();
        let highs = closes.iter().map(|c| c + 1.0).collect();
        let lows = closes.iter().map(|c| c - 1.0).collect();
        (highs, lows, closes)
    }

    #[test]
    fn bounded_when_range_nonzero() {
        let (h, l, c) = oscillating(80);
        let s = stochastic(&h, &l, &c, 14, 3);
        for v in s.k.iter().chain(s.d.iter()).flatten() {
            assert!((0.0..=100.0).contains(v), "stochastic {v} out of range");
        }
    }

    #[test]
    fn warmup_length() {
        let (h, l, c) = oscillating(40);
        let s = stochastic(&h, &l, &c, 14, 3);
        // raw %K from index 13, %K from 15, %D from 17.
        assert!(s.k[14].is_none());
        assert!(s.k[15].is_some());
        assert!(s.d[16].is_none());
        assert!(s.d[17].is_some());
    }

    #[test]
    fn zero_range_is_undefined() {
        let flat = vec![10.0; 30];
        let s = stochastic(&flat, &flat, &flat, 14, 3);
        assert!(s.k.iter().all(Option::is_none));
        assert!(s.d.iter().all(Option::is_none));
    }

    #[test]
    fn close_at_high_reads_100() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let highs = closes.clone();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        let s = stochastic(&highs, &lows, &closes, 5, 3);
        assert!((s.k.last().unwrap().unwrap() - 100.0).abs() < 1e-10);
    }
}
