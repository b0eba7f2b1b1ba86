// =============================================================================
// Layer 7 — Liquidity Sweeps
// =============================================================================
//
// Swing levels are the rolling high/low over `swing_window` bars as of the
// PREVIOUS bar.  The latest candle sweeps liquidity when it trades through a
// level and closes back inside:
//
//   bullish sweep  low  < swing_low  and close > swing_low    => score 75, BUY
//   bearish sweep  high > swing_high and close < swing_high   => score 25, SELL
//   neither                                                   => score 50
//
// A bullish sweep takes precedence when both occur on the same candle.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::config::LiquidityParams;
use crate::features::FeatureFrame;
use crate::indicators::ma::{rolling_max, rolling_min};
use crate::indicators::{lift, nth_back, round_opt};
use crate::types::Signal;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidityReport {
    pub liquidity_score: f64,
    pub swing_high: Option<f64>,
    pub swing_low: Option<f64>,
    pub bullish_sweep: bool,
    pub bearish_sweep: bool,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct LiquidityAnalyzer {
    params: LiquidityParams,
}

impl LiquidityAnalyzer {
    pub fn new(params: LiquidityParams) -> Self {
        Self { params }
    }

    pub fn report(&self, frame: &FeatureFrame) -> LiquidityReport {
        let window = self.params.swing_window;
        let swing_high = nth_back(&rolling_max(&lift(&frame.high), window), 1);
        let swing_low = nth_back(&rolling_min(&lift(&frame.low), window), 1);

        let (bullish_sweep, bearish_sweep) =
            match (frame.high.last(), frame.low.last(), frame.close.last()) {
                (Some(&high), Some(&low), Some(&close)) => (
                    swing_low.is_some_and(|level| low < level && close > level),
                    swing_high.is_some_and(|level| high > level && close < level),
                ),
                _ => (false, false),
            };

        let (liquidity_score, signal) = if bullish_sweep {
            (75.0, Signal::Buy)
        } else if bearish_sweep {
            (25.0, Signal::Sell)
        } else {
            (50.0, Signal::Neutral)
        };

        LiquidityReport {
            liquidity_score,
            swing_high: round_opt(swing_high, 2),
            swing_low: round_opt(swing_low, 2),
            bullish_sweep,
            bearish_sweep,
            signal,
        }
    }
}

impl LayerAnalyzer for LiquidityAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::Liquidity
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::Liquidity(self.report(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::test_support::{flat, series_from_closes};
    use crate::market_data::{Bar, BarSeries};

    fn analyze(series: &BarSeries) -> LiquidityReport {
        let frame = FeatureFrame::derive(series);
        LiquidityAnalyzer::new(LiquidityParams::default()).report(&frame)
    }

    /// 30 bars oscillating between 99 and 101, then `last` appended.
    fn range_then(last: Bar) -> BarSeries {
        let closes: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 99.0 } else { 101.0 }).collect();
        let mut bars = series_from_closes(&closes, 0.5).bars().to_vec();
        bars.push(last);
        BarSeries::new(bars).unwrap()
    }

    #[test]
    fn wick_below_swing_low_is_bullish_sweep() {
        let ts = 30 * 86_400_000;
        let r = analyze(&range_then(Bar::new(ts, 100.0, 100.5, 95.0, 100.0, 1_000.0)));
        assert_eq!(r.swing_low, Some(98.5));
        assert!(r.bullish_sweep);
        assert!(!r.bearish_sweep);
        assert_eq!(r.liquidity_score, 75.0);
        assert_eq!(r.signal, Signal::Buy);
    }

    #[test]
    fn wick_above_swing_high_is_bearish_sweep() {
        let ts = 30 * 86_400_000;
        let r = analyze(&range_then(Bar::new(ts, 100.0, 106.0, 99.5, 100.0, 1_000.0)));
        assert_eq!(r.swing_high, Some(101.5));
        assert!(r.bearish_sweep);
        assert_eq!(r.liquidity_score, 25.0);
        assert_eq!(r.signal, Signal::Sell);
    }

    #[test]
    fn breakout_close_is_not_a_sweep() {
        let ts = 30 * 86_400_000;
        let r = analyze(&range_then(Bar::new(ts, 100.0, 106.0, 99.5, 105.0, 1_000.0)));
        assert!(!r.bearish_sweep);
        assert_eq!(r.signal, Signal::Neutral);
    }

    #[test]
    fn flat_and_short_series_are_neutral() {
        let r = analyze(&flat(250));
        assert_eq!(r.liquidity_score, 50.0);
        assert_eq!(r.signal, Signal::Neutral);

        let r = analyze(&flat(10));
        assert_eq!(r.swing_high, None);
        assert_eq!(r.signal, Signal::Neutral);
    }
}
