// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd      = EMA(fast) - EMA(slow)
//   signal    = EMA(signal_span) of macd
//   histogram = macd - signal
// =============================================================================

use super::ema::ema;
use super::{lift, Series};

/// Bar-aligned MACD lines.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

/// Compute MACD for `closes` with the given fast/slow/signal spans.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> MacdSeries {
    let closes = lift(closes);
    let ema_fast = ema(&closes, fast);
    let ema_slow = ema(&closes, slow);

    let macd_line: Series = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ema(&macd_line, signal_span);

    let histogram = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdSeries {
        macd: macd_line,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_is_exact_difference() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let m = macd(&closes, 12, 26, 9);
        for i in 0..closes.len() {
            let (line, sig, hist) = (m.macd[i].unwrap(), m.signal[i].unwrap(), m.histogram[i].unwrap());
            assert_eq!(hist, line - sig);
        }
    }

    #[test]
    fn flat_series_has_zero_macd() {
        let m = macd(&[50.0; 60], 12, 26, 9);
        assert!(m.macd.iter().all(|v| v.unwrap().abs() < 1e-12));
        assert!(m.histogram.iter().all(|v| v.unwrap().abs() < 1e-12));
    }

    #[test]
    fn rising_series_has_positive_macd() {
        let closes: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let m = macd(&closes, 12, 26, 9);
        assert!(m.macd.last().unwrap().unwrap() > 0.0);
    }
}
