// =============================================================================
// Analysis Layers
// =============================================================================
//
// Ten analyzers, each a pure transform from the feature frame (and, for the
// confirmation layer, from earlier layer reports) to a typed report carrying a
// categorical `signal`.  The registry order is fixed and doubles as the output
// order of the `layers` map:
//
//   1 momentum            6 structure
//   2 volume              7 liquidity
//   3 divergence          8 volatility regime
//   4 volume strength     9 confirmation        (depends on 1, 2, 5)
//   5 trend              10 candle intelligence

pub mod candle_intelligence;
pub mod confirmation;
pub mod divergence;
pub mod liquidity;
pub mod momentum;
pub mod structure;
pub mod trend;
pub mod volatility_regime;
pub mod volume;
pub mod volume_strength;

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::config::IndicatorParams;
use crate::features::FeatureFrame;
use crate::types::Signal;

pub use candle_intelligence::{CandleIntelligenceAnalyzer, CandleReport};
pub use confirmation::{ConfirmationAnalyzer, ConfirmationReport};
pub use divergence::{DivergenceAnalyzer, DivergenceReport};
pub use liquidity::{LiquidityAnalyzer, LiquidityReport};
pub use momentum::{MomentumAnalyzer, MomentumReport};
pub use structure::{StructureAnalyzer, StructureReport};
pub use trend::{TrendAnalyzer, TrendReport};
pub use volatility_regime::{VolatilityRegime, VolatilityRegimeAnalyzer, VolatilityRegimeReport};
pub use volume::{VolumeAnalyzer, VolumeReport};
pub use volume_strength::{VolumeStrengthAnalyzer, VolumeStrengthReport};

// =============================================================================
// Layer identity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerId {
    Momentum,
    Volume,
    Divergence,
    VolumeStrength,
    Trend,
    Structure,
    Liquidity,
    VolatilityRegime,
    Confirmation,
    CandleIntelligence,
}

impl LayerId {
    pub const ALL: [LayerId; 10] = [
        LayerId::Momentum,
        LayerId::Volume,
        LayerId::Divergence,
        LayerId::VolumeStrength,
        LayerId::Trend,
        LayerId::Structure,
        LayerId::Liquidity,
        LayerId::VolatilityRegime,
        LayerId::Confirmation,
        LayerId::CandleIntelligence,
    ];

    /// External key, e.g. `layer_1_momentum`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Momentum => "layer_1_momentum",
            Self::Volume => "layer_2_volume",
            Self::Divergence => "layer_3_divergence",
            Self::VolumeStrength => "layer_4_volume_strength",
            Self::Trend => "layer_5_trend",
            Self::Structure => "layer_6_structure",
            Self::Liquidity => "layer_7_liquidity",
            Self::VolatilityRegime => "layer_8_volatility_regime",
            Self::Confirmation => "layer_9_confirmation",
            Self::CandleIntelligence => "layer_10_candle_intelligence",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Momentum => "RSI, MACD, Stochastic, CMF, ADX, Ichimoku",
            Self::Volume => "OBV, A/D Line, CMF, Volume divergence",
            Self::Divergence => "Delta divergence detection, CDV analysis",
            Self::VolumeStrength => "RVOL, Volume spike detection",
            Self::Trend => "ADX/DMI, Moving averages",
            Self::Structure => "Pivot highs/lows, Structure bias",
            Self::Liquidity => "Liquidity sweeps and hunt detection",
            Self::VolatilityRegime => "ATR percentile, Volatility classification",
            Self::Confirmation => "Cross-layer signal confirmation",
            Self::CandleIntelligence => "Advanced candlestick patterns",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|id| id.name()).collect()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for LayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("Invalid layer name. Available: {}", LayerId::names().join(", "))]
pub struct UnknownLayer {
    pub name: String,
}

impl FromStr for LayerId {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| UnknownLayer { name: s.to_string() })
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Output of one layer. Serialises as the inner report's fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerReport {
    Momentum(MomentumReport),
    Volume(VolumeReport),
    Divergence(DivergenceReport),
    VolumeStrength(VolumeStrengthReport),
    Trend(TrendReport),
    Structure(StructureReport),
    Liquidity(LiquidityReport),
    VolatilityRegime(VolatilityRegimeReport),
    Confirmation(ConfirmationReport),
    CandleIntelligence(CandleReport),
}

impl LayerReport {
    pub fn signal(&self) -> Signal {
        match self {
            Self::Momentum(r) => r.signal,
            Self::Volume(r) => r.signal,
            Self::Divergence(r) => r.signal,
            Self::VolumeStrength(r) => r.signal,
            Self::Trend(r) => r.signal,
            Self::Structure(r) => r.signal,
            Self::Liquidity(r) => r.signal,
            Self::VolatilityRegime(r) => r.signal,
            Self::Confirmation(r) => r.signal,
            Self::CandleIntelligence(r) => r.signal(),
        }
    }
}

/// Layer reports in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerResults {
    entries: Vec<(LayerId, LayerReport)>,
}

impl LayerResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `report` under `id`, replacing any earlier report for that layer.
    pub fn insert(&mut self, id: LayerId, report: LayerReport) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = report,
            None => self.entries.push((id, report)),
        }
    }

    /// Reorder entries to registry order.
    pub fn sort_by_layer(&mut self) {
        self.entries.sort_by_key(|(id, _)| *id);
    }

    pub fn get(&self, id: LayerId) -> Option<&LayerReport> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, report)| report)
    }

    pub fn signal(&self, id: LayerId) -> Option<Signal> {
        self.get(id).map(LayerReport::signal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerId, &LayerReport)> {
        self.entries.iter().map(|(id, report)| (*id, report))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn momentum(&self) -> Option<&MomentumReport> {
        match self.get(LayerId::Momentum)? {
            LayerReport::Momentum(r) => Some(r),
            _ => None,
        }
    }

    pub fn volume(&self) -> Option<&VolumeReport> {
        match self.get(LayerId::Volume)? {
            LayerReport::Volume(r) => Some(r),
            _ => None,
        }
    }

    pub fn trend(&self) -> Option<&TrendReport> {
        match self.get(LayerId::Trend)? {
            LayerReport::Trend(r) => Some(r),
            _ => None,
        }
    }

    pub fn structure(&self) -> Option<&StructureReport> {
        match self.get(LayerId::Structure)? {
            LayerReport::Structure(r) => Some(r),
            _ => None,
        }
    }

    pub fn volatility_regime(&self) -> Option<&VolatilityRegimeReport> {
        match self.get(LayerId::VolatilityRegime)? {
            LayerReport::VolatilityRegime(r) => Some(r),
            _ => None,
        }
    }

    pub fn confirmation(&self) -> Option<&ConfirmationReport> {
        match self.get(LayerId::Confirmation)? {
            LayerReport::Confirmation(r) => Some(r),
            _ => None,
        }
    }
}

impl Serialize for LayerResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, report) in &self.entries {
            map.serialize_entry(id.name(), report)?;
        }
        map.end()
    }
}

// =============================================================================
// Analyzer trait + registry
// =============================================================================

/// One analysis layer.
///
/// `prior` holds every report produced earlier in the run; layers without
/// dependencies ignore it.
pub trait LayerAnalyzer: Send + Sync {
    fn id(&self) -> LayerId;

    /// Layers whose reports must exist in `prior` before this one runs.
    fn dependencies(&self) -> &'static [LayerId] {
        &[]
    }

    fn analyze(&self, frame: &FeatureFrame, prior: &LayerResults) -> LayerReport;
}

/// The ten analyzers in registry order, each holding its own copy of its
/// parameters.
pub fn registry(params: &IndicatorParams) -> Vec<Box<dyn LayerAnalyzer>> {
    vec![
        Box::new(MomentumAnalyzer::new(params.momentum)),
        Box::new(VolumeAnalyzer::new(params.volume)),
        Box::new(DivergenceAnalyzer::new(params.divergence)),
        Box::new(VolumeStrengthAnalyzer::new(params.volume_strength)),
        Box::new(TrendAnalyzer::new(params.trend)),
        Box::new(StructureAnalyzer::new(params.structure)),
        Box::new(LiquidityAnalyzer::new(params.liquidity)),
        Box::new(VolatilityRegimeAnalyzer::new(params.volatility)),
        Box::new(ConfirmationAnalyzer),
        Box::new(CandleIntelligenceAnalyzer),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::market_data::{Bar, BarSeries};

    /// `n` daily bars built from a close path; high/low straddle open/close by
    /// `spread` and volume is constant unless overridden by the caller.
    pub fn series_from_closes(closes: &[f64], spread: f64) -> BarSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let open = if i == 0 { c } else { closes[i - 1] };
                let hi = open.max(c) + spread;
                let lo = open.min(c) - spread;
                Bar::new(i as i64 * 86_400_000, open, hi, lo, c, 1_000.0)
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    pub fn rising(n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        series_from_closes(&closes, 0.5)
    }

    pub fn falling(n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n).map(|i| 400.0 - i as f64).collect();
        series_from_closes(&closes, 0.5)
    }

    pub fn flat(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| Bar::new(i as i64 * 86_400_000, 50.0, 50.0, 50.0, 50.0, 1_000.0))
            .collect();
        BarSeries::new(bars).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for id in LayerId::ALL {
            assert_eq!(id.name().parse::<LayerId>().unwrap(), id);
        }
        let err = "layer_11_magic".parse::<LayerId>().unwrap_err();
        assert!(err.to_string().contains("layer_10_candle_intelligence"));
    }

    #[test]
    fn registry_is_in_layer_order() {
        let ids: Vec<LayerId> = registry(&IndicatorParams::default())
            .iter()
            .map(|a| a.id())
            .collect();
        assert_eq!(ids, LayerId::ALL.to_vec());
    }

    #[test]
    fn only_confirmation_has_dependencies() {
        for analyzer in registry(&IndicatorParams::default()) {
            if analyzer.id() == LayerId::Confirmation {
                assert_eq!(
                    analyzer.dependencies(),
                    &[LayerId::Momentum, LayerId::Volume, LayerId::Trend]
                );
            } else {
                assert!(analyzer.dependencies().is_empty());
            }
        }
    }

    #[test]
    fn results_serialise_in_insertion_order() {
        let mut results = LayerResults::new();
        results.insert(
            LayerId::Structure,
            LayerReport::Structure(StructureReport::default()),
        );
        results.insert(
            LayerId::Divergence,
            LayerReport::Divergence(DivergenceReport::default()),
        );
        let json = serde_json::to_string(&results).unwrap();
        let s = json.find("layer_6_structure").unwrap();
        let d = json.find("layer_3_divergence").unwrap();
        assert!(s < d);
        assert_eq!(results.signal(LayerId::Structure), Some(Signal::Neutral));
        assert!(results.momentum().is_none());
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let mut results = LayerResults::new();
        results.insert(LayerId::Structure, LayerReport::Structure(StructureReport::default()));
        results.insert(LayerId::Structure, LayerReport::Structure(StructureReport::default()));
        assert_eq!(results.len(), 1);
    }
}
