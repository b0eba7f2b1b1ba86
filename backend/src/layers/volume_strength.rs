// =============================================================================
// Layer 4 — Relative Volume (RVOL)
// =============================================================================
//
//   RVOL = current volume / mean volume over the trailing window
//
// Falls back to 1.0 when the average is undefined or zero.  Buckets are
// inclusive at the lower edge:
//   >= 3.0 EXTREME, >= 2.0 HIGH, >= 1.5 ELEVATED, >= 1.0 NORMAL, else LOW
//
// A bullish candle on RVOL > 2 is the only STRONG_BUY; everything else is
// NEUTRAL.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::config::VolumeStrengthParams;
use crate::features::FeatureFrame;
use crate::indicators::{last, ma, round_to};
use crate::types::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RvolState {
    Extreme,
    High,
    Elevated,
    Normal,
    Low,
}

impl RvolState {
    pub fn from_rvol(rvol: f64) -> Self {
        if rvol >= 3.0 {
            Self::Extreme
        } else if rvol >= 2.0 {
            Self::High
        } else if rvol >= 1.5 {
            Self::Elevated
        } else if rvol >= 1.0 {
            Self::Normal
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeStrengthReport {
    pub rvol: f64,
    pub rvol_state: RvolState,
    pub avg_volume: Option<f64>,
    pub current_volume: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct VolumeStrengthAnalyzer {
    params: VolumeStrengthParams,
}

impl VolumeStrengthAnalyzer {
    pub fn new(params: VolumeStrengthParams) -> Self {
        Self { params }
    }

    pub fn report(&self, frame: &FeatureFrame) -> VolumeStrengthReport {
        let current_volume = frame.volume.last().copied().unwrap_or(0.0);
        let avg_volume = last(&ma::sma(&frame.volume, self.params.avg_window));

        let rvol = match avg_volume {
            Some(avg) if avg > 0.0 => current_volume / avg,
            _ => 1.0,
        };
        let bullish = frame.is_bullish.last().copied().unwrap_or(false);

        let signal = if rvol > 2.0 && bullish {
            Signal::StrongBuy
        } else {
            Signal::Neutral
        };

        VolumeStrengthReport {
            rvol: round_to(rvol, 2),
            rvol_state: RvolState::from_rvol(rvol),
            avg_volume,
            current_volume,
            signal,
        }
    }
}

impl LayerAnalyzer for VolumeStrengthAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::VolumeStrength
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::VolumeStrength(self.report(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::test_support::rising;
    use crate::market_data::{Bar, BarSeries};

    fn with_last_volume(volume: f64, bullish: bool) -> BarSeries {
        let mut bars: Vec<Bar> = rising(30).bars().to_vec();
        let last = bars.last_mut().unwrap();
        last.volume = volume;
        if !bullish {
            std::mem::swap(&mut last.open, &mut last.close);
        }
        BarSeries::new(bars).unwrap()
    }

    fn analyze(series: &BarSeries) -> VolumeStrengthReport {
        let frame = FeatureFrame::derive(series);
        VolumeStrengthAnalyzer::new(VolumeStrengthParams::default()).report(&frame)
    }

    #[test]
    fn buckets_are_inclusive_at_lower_edge() {
        assert_eq!(RvolState::from_rvol(3.0), RvolState::Extreme);
        assert_eq!(RvolState::from_rvol(2.0), RvolState::High);
        assert_eq!(RvolState::from_rvol(1.5), RvolState::Elevated);
        assert_eq!(RvolState::from_rvol(1.0), RvolState::Normal);
        assert_eq!(RvolState::from_rvol(0.99), RvolState::Low);
    }

    #[test]
    fn constant_volume_is_normal() {
        let r = analyze(&rising(30));
        assert_eq!(r.rvol, 1.0);
        assert_eq!(r.rvol_state, RvolState::Normal);
        assert_eq!(r.avg_volume, Some(1_000.0));
        assert_eq!(r.signal, Signal::Neutral);
    }

    #[test]
    fn volume_spike_on_bullish_candle_is_strong_buy() {
        // 19 bars of 1000 + 6000 => avg 1250, rvol 4.8
        let r = analyze(&with_last_volume(6_000.0, true));
        assert_eq!(r.rvol, 4.8);
        assert_eq!(r.rvol_state, RvolState::Extreme);
        assert_eq!(r.signal, Signal::StrongBuy);
    }

    #[test]
    fn volume_spike_on_bearish_candle_is_neutral() {
        let r = analyze(&with_last_volume(6_000.0, false));
        assert_eq!(r.rvol_state, RvolState::Extreme);
        assert_eq!(r.signal, Signal::Neutral);
    }

    #[test]
    fn short_history_falls_back_to_unit_rvol() {
        let r = analyze(&rising(5));
        assert_eq!(r.avg_volume, None);
        assert_eq!(r.rvol, 1.0);
    }
}
