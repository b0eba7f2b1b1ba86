// =============================================================================
// Layer 3 — Cumulative Delta Volume
// =============================================================================
//
// Each bar's volume is signed by its candle colour (close >= open counts as
// buying) and accumulated into CDV.  The bias follows the sign of the CDV
// slope over the trailing window: BUY when rising, otherwise SELL.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::config::DivergenceParams;
use crate::features::FeatureFrame;
use crate::indicators::round_to;
use crate::indicators::slope::trailing_slope;
use crate::types::{Direction, Signal};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DivergenceReport {
    pub cdv: f64,
    pub cdv_slope: f64,
    pub cdv_bias: Direction,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct DivergenceAnalyzer {
    params: DivergenceParams,
}

impl DivergenceAnalyzer {
    pub fn new(params: DivergenceParams) -> Self {
        Self { params }
    }

    pub fn report(&self, frame: &FeatureFrame) -> DivergenceReport {
        let cdv = cumulative_delta(&frame.open, &frame.close, &frame.volume);
        let cdv_slope = trailing_slope(&cdv, self.params.slope_window).unwrap_or(0.0);

        let (cdv_bias, signal) = if cdv_slope > 0.0 {
            (Direction::Bullish, Signal::Buy)
        } else {
            (Direction::Bearish, Signal::Sell)
        };

        DivergenceReport {
            cdv: cdv.last().copied().unwrap_or(0.0),
            cdv_slope: round_to(cdv_slope, 2),
            cdv_bias,
            signal,
        }
    }
}

impl LayerAnalyzer for DivergenceAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::Divergence
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::Divergence(self.report(frame))
    }
}

fn cumulative_delta(opens: &[f64], closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    opens
        .iter()
        .zip(closes)
        .zip(volumes)
        .map(|((&open, &close), &volume)| {
            total += if close >= open { volume } else { -volume };
            total
        })
        .collect()
}
