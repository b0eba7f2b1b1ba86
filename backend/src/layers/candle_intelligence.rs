// =============================================================================
// Layer 10 — Candle Intelligence
// =============================================================================
//
// Single- and two-candle patterns on the latest bar:
//
//   bullish engulfing  bullish after a non-bullish candle, body > 1.1 × previous body
//   bearish engulfing  non-bullish after a bullish candle, body > 1.1 × previous body
//   doji               body < 10% of the candle range
//   hammer             bullish, lower wick > 2 × body
//   shooting star      non-bullish, upper wick > 2 × body
//
//   pattern_score = +60 (bullish engulfing / hammer)
//                   -60 (bearish engulfing / shooting star)
//                     0 otherwise
//
// BUY above +40, SELL below -40.  Fewer than three bars yields an error
// marker with a NEUTRAL signal.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::features::FeatureFrame;
use crate::indicators::round_to;
use crate::types::{Signal, Strength};

const MIN_BARS: usize = 3;
const ENGULF_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsufficientCandles {
    pub error: String,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlePattern {
    pub pattern_score: f64,
    pub pattern_strength: Strength,
    pub body_percent: f64,
    pub is_bullish: bool,
    pub is_doji: bool,
    pub is_hammer: bool,
    pub is_shooting_star: bool,
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CandleReport {
    Insufficient(InsufficientCandles),
    Pattern(CandlePattern),
}

impl CandleReport {
    pub fn signal(&self) -> Signal {
        match self {
            Self::Insufficient(r) => r.signal,
            Self::Pattern(r) => r.signal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CandleIntelligenceAnalyzer;

impl CandleIntelligenceAnalyzer {
    pub fn report(&self, frame: &FeatureFrame) -> CandleReport {
        let n = frame.len();
        if n < MIN_BARS {
            return CandleReport::Insufficient(InsufficientCandles {
                error: "Not enough data".to_string(),
                signal: Signal::Neutral,
            });
        }
        let (cur, prev) = (n - 1, n - 2);

        let is_bullish = frame.is_bullish[cur];
        let body = frame.body_size[cur];
        let prev_bullish = frame.is_bullish[prev];
        let prev_body = frame.body_size[prev];
        let body_percent = frame.body_percent[cur];

        let engulfs = body > prev_body * ENGULF_FACTOR;
        let bullish_engulfing = is_bullish && !prev_bullish && engulfs;
        let bearish_engulfing = !is_bullish && prev_bullish && engulfs;
        let is_doji = body_percent < 0.1;
        let is_hammer = is_bullish && frame.lower_wick[cur] > body * 2.0;
        let is_shooting_star = !is_bullish && frame.upper_wick[cur] > body * 2.0;

        let pattern_score: f64 = if bullish_engulfing || is_hammer {
            60.0
        } else if bearish_engulfing || is_shooting_star {
            -60.0
        } else {
            0.0
        };

        let pattern_strength = if pattern_score.abs() > 50.0 {
            Strength::Strong
        } else if pattern_score.abs() > 30.0 {
            Strength::Moderate
        } else {
            Strength::Weak
        };

        let signal = if pattern_score > 40.0 {
            Signal::Buy
        } else if pattern_score < -40.0 {
            Signal::Sell
        } else {
            Signal::Neutral
        };

        CandleReport::Pattern(CandlePattern {
            pattern_score,
            pattern_strength,
            body_percent: round_to(body_percent * 100.0, 2),
            is_bullish,
            is_doji,
            is_hammer,
            is_shooting_star,
            bullish_engulfing,
            bearish_engulfing,
            signal,
        })
    }
}

impl LayerAnalyzer for CandleIntelligenceAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::CandleIntelligence
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::CandleIntelligence(self.report(frame))
    }
}
