// =============================================================================
// Ichimoku reference lines
// =============================================================================
//
//   conversion = midpoint(high/low, conv)
//   base       = midpoint(high/low, base)
//   span A     = (conversion + base) / 2
//   span B     = midpoint(high/low, span)
//
// The leading spans are aligned with the bar they were computed on; no
// forward displacement is applied, so "price above the cloud" compares the
// current close with spans built from the current window.
// =============================================================================

use super::ma::{rolling_max, rolling_min};
use super::{lift, Series};
use crate::types::Direction;

#[derive(Debug, Clone)]
pub struct IchimokuLines {
    pub conversion: Series,
    pub base: Series,
    pub span_a: Series,
    pub span_b: Series,
}

fn midpoint(highs: &[f64], lows: &[f64], window: usize) -> Series {
    let hi = rolling_max(&lift(highs), window);
    let lo = rolling_min(&lift(lows), window);
    hi.iter()
        .zip(lo.iter())
        .map(|(h, l)| Some(((*h)? + (*l)?) / 2.0))
        .collect()
}

pub fn ichimoku(highs: &[f64], lows: &[f64], conv: usize, base: usize, span: usize) -> IchimokuLines {
    let conversion = midpoint(highs, lows, conv);
    let base_line = midpoint(highs, lows, base);
    let span_a = conversion
        .iter()
        .zip(base_line.iter())
        .map(|(c, b)| Some(((*c)? + (*b)?) / 2.0))
        .collect();
    let span_b = midpoint(highs, lows, span);

    IchimokuLines {
        conversion,
        base: base_line,
        span_a,
        span_b,
    }
}

/// Price position relative to both leading spans.
///
/// BULLISH above both, BEARISH below both, NEUTRAL inside the cloud or when
/// either span is undefined.
pub fn cloud_trend(price: f64, span_a: Option<f64>, span_b: Option<f64>) -> Direction {
    match (span_a, span_b) {
        (Some(a), Some(b)) if price > a && price > b => Direction::Bullish,
        (Some(a), Some(b)) if price < a && price < b => Direction::Bearish,
        _ => Direction::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_window_midpoints() {
        let highs: Vec<f64> = (1..=60).map(|x| x as f64 + 1.0).collect();
        let lows: Vec<f64> = (1..=60).map(|x| x as f64 - 1.0).collect();
        let ich = ichimoku(&highs, &lows, 9, 26, 52);
        // Last bar: highs max = 61, conv low = 52 - 1 = 51 -> 56
        assert_eq!(ich.conversion[59], Some(56.0));
        // base: max 61, min lows[34] = 34 -> 47.5
        assert_eq!(ich.base[59], Some(47.5));
        assert_eq!(ich.span_a[59], Some((56.0 + 47.5) / 2.0));
        assert!(ich.span_b[50].is_none());
        assert!(ich.span_b[51].is_some());
    }

    #[test]
    fn cloud_classification() {
        assert_eq!(cloud_trend(10.0, Some(5.0), Some(8.0)), Direction::Bullish);
        assert_eq!(cloud_trend(4.0, Some(5.0), Some(8.0)), Direction::Bearish);
        assert_eq!(cloud_trend(6.0, Some(5.0), Some(8.0)), Direction::Neutral);
        assert_eq!(cloud_trend(6.0, None, Some(1.0)), Direction::Neutral);
    }
}
