// =============================================================================
// Layer 2 — Volume Flow
// =============================================================================
//
// OBV and the A/D line are reduced to their least-squares slope over the last
// `slope_window` bars, scaled by 1/100 and clipped to ±100.  Together with
// CMF * 100 they form:
//
//   volume_flow_score = (obv_strength + ad_strength + cmf_strength) / 3
//
// Signal:
//   STRONG_BUY   score > 50, both slopes rising, CMF > threshold
//   BUY          score > 20, OBV rising
//   (mirror image for SELL / STRONG_SELL), otherwise NEUTRAL.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::config::VolumeParams;
use crate::features::FeatureFrame;
use crate::indicators::slope::trailing_slope;
use crate::indicators::{flow, last, ma, round_opt, round_to};
use crate::types::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObvTrend {
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdTrend {
    Accumulation,
    Distribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeReport {
    pub volume_flow_score: f64,
    pub obv: f64,
    pub obv_slope: f64,
    pub obv_trend: ObvTrend,
    pub ad_line: f64,
    pub ad_slope: f64,
    pub ad_trend: AdTrend,
    pub cmf: Option<f64>,
    pub volume_ratio: f64,
    pub avg_volume: Option<f64>,
    pub current_volume: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct VolumeAnalyzer {
    params: VolumeParams,
}

impl VolumeAnalyzer {
    pub fn new(params: VolumeParams) -> Self {
        Self { params }
    }

    pub fn report(&self, frame: &FeatureFrame) -> VolumeReport {
        let p = &self.params;

        let obv = flow::obv(&frame.close, &frame.volume);
        let ad = flow::ad_line(&frame.high, &frame.low, &frame.close, &frame.volume);
        let cmf = last(&flow::cmf(
            &frame.high,
            &frame.low,
            &frame.close,
            &frame.volume,
            p.cmf_length,
        ));

        // Too little history for a slope reads as flat.
        let obv_slope = trailing_slope(&obv, p.slope_window).unwrap_or(0.0);
        let ad_slope = trailing_slope(&ad, p.slope_window).unwrap_or(0.0);

        let current_volume = frame.volume.last().copied().unwrap_or(0.0);
        let avg_volume = last(&ma::sma(&frame.volume, p.vol_sma_length));
        let volume_ratio = match avg_volume {
            Some(avg) if avg > 0.0 => current_volume / avg,
            _ => 1.0,
        };

        let obv_strength = slope_strength(obv_slope);
        let ad_strength = slope_strength(ad_slope);
        let cmf_strength = cmf.map_or(0.0, |c| c * 100.0);
        let volume_flow_score = (obv_strength + ad_strength + cmf_strength) / 3.0;

        let signal = self.signal(volume_flow_score, obv_slope, ad_slope, cmf);

        VolumeReport {
            volume_flow_score: round_to(volume_flow_score, 2),
            obv: round_to(obv.last().copied().unwrap_or(0.0), 0),
            obv_slope: round_to(obv_slope, 2),
            obv_trend: if obv_slope > 0.0 {
                ObvTrend::Rising
            } else {
                ObvTrend::Falling
            },
            ad_line: round_to(ad.last().copied().unwrap_or(0.0), 0),
            ad_slope: round_to(ad_slope, 2),
            ad_trend: if ad_slope > 0.0 {
                AdTrend::Accumulation
            } else {
                AdTrend::Distribution
            },
            cmf: round_opt(cmf, 4),
            volume_ratio: round_to(volume_ratio, 2),
            avg_volume: round_opt(avg_volume, 0),
            current_volume: round_to(current_volume, 0),
            signal,
        }
    }

    fn signal(&self, score: f64, obv_slope: f64, ad_slope: f64, cmf: Option<f64>) -> Signal {
        let threshold = self.params.cmf_threshold;
        let cmf_above = cmf.is_some_and(|c| c > threshold);
        let cmf_below = cmf.is_some_and(|c| c < -threshold);

        if score > 50.0 && obv_slope > 0.0 && ad_slope > 0.0 && cmf_above {
            Signal::StrongBuy
        } else if score > 20.0 && obv_slope > 0.0 {
            Signal::Buy
        } else if score < -50.0 && obv_slope < 0.0 && ad_slope < 0.0 && cmf_below {
            Signal::StrongSell
        } else if score < -20.0 && obv_slope < 0.0 {
            Signal::Sell
        } else {
            Signal::Neutral
        }
    }
}

impl LayerAnalyzer for VolumeAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::Volume
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::Volume(self.report(frame))
    }
}

fn slope_strength(slope: f64) -> f64 {
    (slope / 100.0).clamp(-100.0, 100.0)
}
