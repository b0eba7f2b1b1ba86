// =============================================================================
// Layer 8 — Volatility Regime
// =============================================================================
//
//   ATRP          = ATR(atr_length) / close * 100
//   ATRP smoothed = SMA(smoothing) of ATRP
//
// The latest smoothed ATRP is ranked against the 20/40/60/80th percentiles of
// the trailing `rank_window` defined smoothed values:
//
//   <= p20 LOW | <= p40 NORMAL-LOW | <= p60 NORMAL | <= p80 ELEVATED | EXTREME
//
// Informational only: the signal is always NEUTRAL.  The aggregator reads the
// regime directly.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::config::VolatilityParams;
use crate::features::FeatureFrame;
use crate::indicators::percentile::PercentileBands;
use crate::indicators::{atr, last, ma, round_opt, round_to};
use crate::types::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolatilityRegime {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "NORMAL-LOW")]
    NormalLow,
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "ELEVATED")]
    Elevated,
    #[serde(rename = "EXTREME")]
    Extreme,
}

impl VolatilityRegime {
    fn from_bucket(bucket: usize) -> Self {
        match bucket {
            0 => Self::Low,
            1 => Self::NormalLow,
            2 => Self::Normal,
            3 => Self::Elevated,
            _ => Self::Extreme,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityRegimeReport {
    pub regime: VolatilityRegime,
    pub atrp: f64,
    pub atr: Option<f64>,
    pub p20: Option<f64>,
    pub p40: Option<f64>,
    pub p60: Option<f64>,
    pub p80: Option<f64>,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct VolatilityRegimeAnalyzer {
    params: VolatilityParams,
}

impl VolatilityRegimeAnalyzer {
    pub fn new(params: VolatilityParams) -> Self {
        Self { params }
    }

    pub fn report(&self, frame: &FeatureFrame) -> VolatilityRegimeReport {
        let p = &self.params;

        let atr_series = atr::atr(&frame.true_range, p.atr_length);
        let atrp = atr::atr_pct(&frame.true_range, &frame.close, p.atr_length);
        let smoothed = ma::rolling_mean(&atrp, p.smoothing);

        let defined: Vec<f64> = smoothed.iter().flatten().copied().collect();
        let sample = &defined[defined.len().saturating_sub(p.rank_window)..];
        let bands = PercentileBands::from_sample(sample);
        let current = last(&smoothed);

        let regime = match (bands, current) {
            (Some(bands), Some(value)) => VolatilityRegime::from_bucket(bands.bucket(value)),
            _ => VolatilityRegime::Normal,
        };

        VolatilityRegimeReport {
            regime,
            atrp: current.map_or(0.0, |v| round_to(v, 4)),
            atr: round_opt(last(&atr_series), 4),
            p20: round_opt(bands.map(|b| b.p20), 4),
            p40: round_opt(bands.map(|b| b.p40), 4),
            p60: round_opt(bands.map(|b| b.p60), 4),
            p80: round_opt(bands.map(|b| b.p80), 4),
            signal: Signal::Neutral,
        }
    }
}

impl LayerAnalyzer for VolatilityRegimeAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::VolatilityRegime
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::VolatilityRegime(self.report(frame))
    }
}
