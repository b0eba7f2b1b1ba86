// =============================================================================
// Layer 5 — Trend
// =============================================================================
//
//   ma_stack  = +1  close > MA20 > MA50 > MA200
//               -1  close < MA20 < MA50 < MA200
//                0  otherwise (or any MA undefined)
//   dmi_sign  = +1 when +DI > -DI, else -1
//   trend_score = (ma_stack + dmi_sign) / 2 * 100      ∈ {-100, -50, 0, 50, 100}
//
// STRONG_BUY / STRONG_SELL need |score| > 50 and ADX > 25; otherwise NEUTRAL.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::config::TrendParams;
use crate::features::FeatureFrame;
use crate::indicators::{adx, last, ma, round_opt, round_to};
use crate::types::{Direction, Signal, Strength};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub trend_score: f64,
    pub trend_direction: Direction,
    pub trend_strength: Strength,
    pub adx: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    params: TrendParams,
}

impl TrendAnalyzer {
    pub fn new(params: TrendParams) -> Self {
        Self { params }
    }

    pub fn report(&self, frame: &FeatureFrame) -> TrendReport {
        let p = &self.params;

        let fast = last(&ma::sma(&frame.close, p.ma_fast));
        let mid = last(&ma::sma(&frame.close, p.ma_mid));
        let slow = last(&ma::sma(&frame.close, p.ma_slow));
        let dmi = adx::dmi(&frame.high, &frame.low, &frame.true_range, p.adx_length);
        let adx_now = last(&dmi.adx);

        let close = frame.close.last().copied();
        let stack = ma_stack(close, fast, mid, slow);
        let (trend_direction, dmi_sign) = if dmi.latest_bullish() {
            (Direction::Bullish, 1.0)
        } else {
            (Direction::Bearish, -1.0)
        };
        let trend_score = (stack + dmi_sign) / 2.0 * 100.0;

        let trending = adx_now.is_some_and(|a| a > 25.0);
        let signal = if trend_score > 50.0 && trending {
            Signal::StrongBuy
        } else if trend_score < -50.0 && trending {
            Signal::StrongSell
        } else {
            Signal::Neutral
        };

        TrendReport {
            trend_score: round_to(trend_score, 2),
            trend_direction,
            trend_strength: Strength::from_adx(adx_now),
            adx: round_opt(adx_now, 2),
            plus_di: round_opt(last(&dmi.plus_di), 2),
            minus_di: round_opt(last(&dmi.minus_di), 2),
            ma20: round_opt(fast, 2),
            ma50: round_opt(mid, 2),
            ma200: round_opt(slow, 2),
            signal,
        }
    }
}

impl LayerAnalyzer for TrendAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::Trend
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::Trend(self.report(frame))
    }
}

fn ma_stack(close: Option<f64>, fast: Option<f64>, mid: Option<f64>, slow: Option<f64>) -> f64 {
    match (close, fast, mid, slow) {
        (Some(c), Some(f), Some(m), Some(s)) if c > f && f > m && m > s => 1.0,
        (Some(c), Some(f), Some(m), Some(s)) if c < f && f < m && m < s => -1.0,
        _ => 0.0,
    }
}
