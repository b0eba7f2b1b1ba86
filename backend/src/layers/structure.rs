// =============================================================================
// Layer 6 — Market Structure
// =============================================================================
//
// Pivot levels come from centered rolling extremes over `2 * pivot_len + 1`
// bars.  The newest fully formed window ends on the latest bar, so the
// reference high/low always include the current candle.  With fewer bars
// than one window the current high/low are used instead.
//
//   close > last_high  => BULLISH (BUY)
//   close < last_low   => BEARISH (SELL)
//   otherwise          => NEUTRAL
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::config::StructureParams;
use crate::features::FeatureFrame;
use crate::indicators::ma::{centered_max, centered_min};
use crate::indicators::round_to;
use crate::types::{Direction, Signal};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureReport {
    pub bias: Direction,
    pub last_high: f64,
    pub last_low: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct StructureAnalyzer {
    params: StructureParams,
}

impl StructureAnalyzer {
    pub fn new(params: StructureParams) -> Self {
        Self { params }
    }

    pub fn report(&self, frame: &FeatureFrame) -> StructureReport {
        let (Some(&close), Some(&high), Some(&low)) =
            (frame.close.last(), frame.high.last(), frame.low.last())
        else {
            return StructureReport::default();
        };

        let half = self.params.pivot_len;
        let last_high = last_defined(&centered_max(&frame.high, half)).unwrap_or(high);
        let last_low = last_defined(&centered_min(&frame.low, half)).unwrap_or(low);

        let (bias, signal) = if close > last_high {
            (Direction::Bullish, Signal::Buy)
        } else if close < last_low {
            (Direction::Bearish, Signal::Sell)
        } else {
            (Direction::Neutral, Signal::Neutral)
        };

        StructureReport {
            bias,
            last_high: round_to(last_high, 2),
            last_low: round_to(last_low, 2),
            signal,
        }
    }
}

impl LayerAnalyzer for StructureAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::Structure
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::Structure(self.report(frame))
    }
}

fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}
