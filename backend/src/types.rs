// =============================================================================
// Shared types used across the TradePilot analysis engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Categorical verdict every layer emits. Individual layers only use a subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    StrongBuy,
    Buy,
    #[default]
    Neutral,
    Sell,
    StrongSell,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Neutral => "NEUTRAL",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG_SELL",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directional bias used for trends, cloud position and the overall verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Three-tier strength label shared by ADX and candle-pattern classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    /// STRONG above 40, MODERATE above 25, otherwise (or undefined) WEAK.
    pub fn from_adx(adx: Option<f64>) -> Self {
        match adx {
            Some(v) if v > 40.0 => Self::Strong,
            Some(v) if v > 25.0 => Self::Moderate,
            _ => Self::Weak,
        }
    }
}

/// Final trade recommendation derived from the overall direction and confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "WEAK BUY")]
    WeakBuy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "WEAK SELL")]
    WeakSell,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::WeakBuy => "WEAK BUY",
            Self::Hold => "HOLD",
            Self::WeakSell => "WEAK SELL",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG SELL",
        };
        f.write_str(label)
    }
}
