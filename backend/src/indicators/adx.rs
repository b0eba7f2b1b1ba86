// =============================================================================
// Directional Movement Index (DMI) and Average Directional Index (ADX)
// =============================================================================
//
// Calculation pipeline (all averages are simple rolling means):
//   1. +DM = up_move   if up_move > down_move and up_move > 0, else 0
//      -DM = down_move if down_move > up_move and down_move > 0, else 0
//      where up_move = high - prev_high, down_move = prev_low - low.
//   2. ATR = SMA(period) of true range.
//   3. +DI = 100 * SMA(+DM) / ATR,  -DI = 100 * SMA(-DM) / ATR
//   4. DX  = 100 * |+DI - -DI| / (+DI + -DI)
//   5. ADX = SMA(period) of DX.
//
// Interpretation:
//   ADX > 25  => trending market
//   ADX > 40  => strong trend
// =============================================================================

use super::atr::atr;
use super::ma::rolling_mean;
use super::{safe_div, Series};

/// Bar-aligned DMI/ADX lines.
#[derive(Debug, Clone)]
pub struct DmiSeries {
    pub plus_di: Series,
    pub minus_di: Series,
    pub adx: Series,
}

impl DmiSeries {
    /// `true` when the latest +DI is strictly above the latest -DI.
    ///
    /// Undefined lines never read as bullish.
    pub fn latest_bullish(&self) -> bool {
        matches!(
            (super::last(&self.plus_di), super::last(&self.minus_di)),
            (Some(p), Some(m)) if p > m
        )
    }
}

/// Compute +DI, -DI and ADX from OHLC columns and the precomputed true range.
pub fn dmi(highs: &[f64], lows: &[f64], true_range: &[Option<f64>], period: usize) -> DmiSeries {
    let n = highs.len();
    let mut plus_dm = Vec::with_capacity(n);
    let mut minus_dm = Vec::with_capacity(n);

    for i in 0..n {
        if i == 0 {
            plus_dm.push(Some(0.0));
            minus_dm.push(Some(0.0));
            continue;
        }
        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];

        let pdm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let mdm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };
        plus_dm.push(Some(pdm));
        minus_dm.push(Some(mdm));
    }

    let atr = atr(true_range, period);
    let plus_avg = rolling_mean(&plus_dm, period);
    let minus_avg = rolling_mean(&minus_dm, period);

    let plus_di: Series = (0..n)
        .map(|i| safe_div(100.0 * plus_avg[i]?, atr[i]?))
        .collect();
    let minus_di: Series = (0..n)
        .map(|i| safe_div(100.0 * minus_avg[i]?, atr[i]?))
        .collect();

    let dx: Series = (0..n)
        .map(|i| {
            let (p, m) = (plus_di[i]?, minus_di[i]?);
            safe_div(100.0 * (p - m).abs(), p + m)
        })
        .collect();

    let adx = rolling_mean(&dx, period);

    DmiSeries {
        plus_di,
        minus_di,
        adx,
    }
}
