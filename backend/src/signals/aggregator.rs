// =============================================================================
// Overall Signal Aggregator — fixed-weight vote over five layers
// =============================================================================
//
// Contributions (each a small integer vote):
//   momentum      sign(momentum_score)                      weight 0.25
//   volume        sign(volume_flow_score)                   weight 0.20
//   trend         sign(trend_score)                         weight 0.20
//   volatility    LOW/NORMAL +1, EXTREME -1, otherwise 0    weight 0.10
//   confirmation  confirmation_signal (-2..=2)              weight 0.25
//
//   weighted_signal = Σ vote × weight, clamped to [-1, 1], rounded to 3 dp
//   confidence      = |weighted_signal| × 100
//
// Direction is BULLISH above +threshold, BEARISH below -threshold (strict),
// otherwise NEUTRAL.  The recommendation tier follows the confidence.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::config::AggregatorWeights;
use crate::indicators::round_to;
use crate::layers::{LayerResults, VolatilityRegime};
use crate::types::{Direction, Recommendation};

/// Per-layer votes fed into the weighted sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributingSignals {
    pub momentum: i64,
    pub volume: i64,
    pub trend: i64,
    pub volatility: i64,
    pub confirmation: i64,
}

impl ContributingSignals {
    /// Collect votes from layer reports. A missing or undefined input votes 0.
    pub fn from_results(layers: &LayerResults) -> Self {
        Self {
            momentum: sign(layers.momentum().and_then(|r| r.momentum_score)),
            volume: sign(layers.volume().map(|r| r.volume_flow_score)),
            trend: sign(layers.trend().map(|r| r.trend_score)),
            volatility: layers
                .volatility_regime()
                .map_or(0, |r| regime_vote(r.regime)),
            confirmation: layers.confirmation().map_or(0, |r| r.confirmation_signal),
        }
    }
}

/// Final verdict of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallSignal {
    pub direction: Direction,
    pub confidence: f64,
    pub weighted_signal: f64,
    pub recommendation: Recommendation,
    pub contributing_signals: ContributingSignals,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalAggregator {
    weights: AggregatorWeights,
}

impl SignalAggregator {
    pub fn new(weights: AggregatorWeights) -> Self {
        Self { weights }
    }

    pub fn aggregate(&self, layers: &LayerResults) -> OverallSignal {
        self.combine(ContributingSignals::from_results(layers))
    }

    /// Weight `votes` into the overall signal.
    pub fn combine(&self, votes: ContributingSignals) -> OverallSignal {
        let w = &self.weights;

        let raw = votes.momentum as f64 * w.momentum
            + votes.volume as f64 * w.volume
            + votes.trend as f64 * w.trend
            + votes.volatility as f64 * w.volatility
            + votes.confirmation as f64 * w.confirmation;

        // A full-strength confirmation vote can push the sum past 1.
        let weighted_signal = round_to(raw.clamp(-1.0, 1.0), 3);
        let confidence = round_to(weighted_signal.abs() * 100.0, 2);

        let direction = if weighted_signal > w.direction_threshold {
            Direction::Bullish
        } else if weighted_signal < -w.direction_threshold {
            Direction::Bearish
        } else {
            Direction::Neutral
        };

        OverallSignal {
            direction,
            confidence,
            weighted_signal,
            recommendation: self.recommend(direction, confidence),
            contributing_signals: votes,
        }
    }

    fn recommend(&self, direction: Direction, confidence: f64) -> Recommendation {
        let strong = confidence > self.weights.strong_confidence;
        let moderate = confidence > self.weights.moderate_confidence;

        match direction {
            Direction::Bullish if strong => Recommendation::StrongBuy,
            Direction::Bullish if moderate => Recommendation::Buy,
            Direction::Bullish => Recommendation::WeakBuy,
            Direction::Bearish if strong => Recommendation::StrongSell,
            Direction::Bearish if moderate => Recommendation::Sell,
            Direction::Bearish => Recommendation::WeakSell,
            Direction::Neutral => Recommendation::Hold,
        }
    }
}

fn sign(value: Option<f64>) -> i64 {
    match value {
        Some(v) if v > 0.0 => 1,
        Some(v) if v < 0.0 => -1,
        _ => 0,
    }
}

fn regime_vote(regime: VolatilityRegime) -> i64 {
    match regime {
        VolatilityRegime::Low | VolatilityRegime::Normal => 1,
        VolatilityRegime::Extreme => -1,
        VolatilityRegime::NormalLow | VolatilityRegime::Elevated => 0,
    }
}
