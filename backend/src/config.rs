// =============================================================================
// Engine Configuration — immutable settings loaded once at startup
// =============================================================================
//
// Every tunable window length and weight lives here.  The configuration is
// read from a JSON file at startup, optionally overridden from the
// environment, and never mutated afterwards; each analyzer receives its own
// copy of the parameters it needs.
//
// All fields carry serde defaults so a missing or partial file still yields a
// complete configuration.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_min_bars() -> usize {
    200
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_base_url() -> String {
    "https://api.polygon.io".to_string()
}

fn default_limit() -> u32 {
    730
}

fn default_timeout_secs() -> u64 {
    10
}

// =============================================================================
// Server / upstream
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Never written back out; supplied via `POLYGON_API_KEY`.
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Default number of bars (and look-back days) requested per analysis.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            default_limit: default_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// Layer parameters
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub rsi_length: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Trailing window for the MACD histogram magnitude normaliser.
    pub macd_norm_window: usize,
    pub stoch_length: usize,
    pub stoch_smooth: usize,
    pub cmf_length: usize,
    pub adx_length: usize,
    pub ichimoku_conv: usize,
    pub ichimoku_base: usize,
    pub ichimoku_span: usize,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            rsi_length: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            macd_norm_window: 100,
            stoch_length: 14,
            stoch_smooth: 3,
            cmf_length: 20,
            adx_length: 14,
            ichimoku_conv: 9,
            ichimoku_base: 26,
            ichimoku_span: 52,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeParams {
    pub cmf_length: usize,
    pub cmf_threshold: f64,
    pub vol_sma_length: usize,
    pub slope_window: usize,
}

impl Default for VolumeParams {
    fn default() -> Self {
        Self {
            cmf_length: 20,
            cmf_threshold: 0.05,
            vol_sma_length: 20,
            slope_window: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DivergenceParams {
    pub slope_window: usize,
}

impl Default for DivergenceParams {
    fn default() -> Self {
        Self { slope_window: 20 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeStrengthParams {
    pub avg_window: usize,
}

impl Default for VolumeStrengthParams {
    fn default() -> Self {
        Self { avg_window: 20 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    pub ma_fast: usize,
    pub ma_mid: usize,
    pub ma_slow: usize,
    pub adx_length: usize,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            ma_fast: 20,
            ma_mid: 50,
            ma_slow: 200,
            adx_length: 14,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureParams {
    /// Bars on each side of a pivot (window = 2 * pivot_len + 1).
    pub pivot_len: usize,
}

impl Default for StructureParams {
    fn default() -> Self {
        Self { pivot_len: 5 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityParams {
    pub swing_window: usize,
}

impl Default for LiquidityParams {
    fn default() -> Self {
        Self { swing_window: 20 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityParams {
    pub atr_length: usize,
    pub smoothing: usize,
    pub rank_window: usize,
}

impl Default for VolatilityParams {
    fn default() -> Self {
        Self {
            atr_length: 14,
            smoothing: 5,
            rank_window: 100,
        }
    }
}

/// Per-layer indicator parameters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub momentum: MomentumParams,
    pub volume: VolumeParams,
    pub divergence: DivergenceParams,
    pub volume_strength: VolumeStrengthParams,
    pub trend: TrendParams,
    pub structure: StructureParams,
    pub liquidity: LiquidityParams,
    pub volatility: VolatilityParams,
}

// =============================================================================
// Aggregator weights
// =============================================================================

/// Fixed weights and thresholds for the overall signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorWeights {
    pub momentum: f64,
    pub volume: f64,
    pub trend: f64,
    pub volatility: f64,
    pub confirmation: f64,
    /// |weighted_signal| must exceed this to leave NEUTRAL.
    pub direction_threshold: f64,
    /// Confidence above this yields the STRONG recommendation tier.
    pub strong_confidence: f64,
    /// Confidence above this yields the plain recommendation tier.
    pub moderate_confidence: f64,
}

impl Default for AggregatorWeights {
    fn default() -> Self {
        Self {
            momentum: 0.25,
            volume: 0.20,
            trend: 0.20,
            volatility: 0.10,
            confirmation: 0.25,
            direction_threshold: 0.3,
            strong_confidence: 70.0,
            moderate_confidence: 50.0,
        }
    }
}

impl AggregatorWeights {
    pub fn total(&self) -> f64 {
        self.momentum + self.volume + self.trend + self.volatility + self.confirmation
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub polygon: PolygonConfig,

    /// Minimum number of bars the builder accepts before invoking the engine.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,

    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub weights: AggregatorWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            polygon: PolygonConfig::default(),
            min_bars: default_min_bars(),
            indicators: IndicatorParams::default(),
            weights: AggregatorWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            min_bars = config.min_bars,
            bind_addr = %config.server.bind_addr,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Apply `POLYGON_API_KEY`, `POLYGON_BASE_URL` and `TRADEPILOT_BIND_ADDR`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("POLYGON_API_KEY") {
            self.polygon.api_key = key;
        }
        if let Some(url) = lookup("POLYGON_BASE_URL").filter(|s| !s.trim().is_empty()) {
            self.polygon.base_url = url;
        }
        if let Some(addr) = lookup("TRADEPILOT_BIND_ADDR").filter(|s| !s.trim().is_empty()) {
            self.server.bind_addr = addr;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.min_bars, 200);
        assert_eq!(cfg.polygon.default_limit, 730);
        assert_eq!(cfg.indicators.trend.ma_slow, 200);
        assert_eq!(cfg.indicators.volatility.rank_window, 100);
        assert_eq!(cfg.indicators.momentum.ichimoku_span, 52);
        assert_eq!(cfg.indicators.structure.pivot_len, 5);
        assert!((cfg.weights.direction_threshold - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn weights_sum_to_one() {
        assert!((AggregatorWeights::default().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.min_bars, 200);
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.indicators.momentum.rsi_length, 14);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "min_bars": 50, "indicators": { "trend": { "ma_slow": 100 } } }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.min_bars, 50);
        assert_eq!(cfg.indicators.trend.ma_slow, 100);
        assert_eq!(cfg.indicators.trend.ma_fast, 20);
        assert_eq!(cfg.indicators.volume.slope_window, 5);
    }

    #[test]
    fn api_key_is_never_serialised() {
        let mut cfg = EngineConfig::default();
        cfg.polygon.api_key = "secret".into();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn overrides_apply_from_lookup() {
        let mut cfg = EngineConfig::default();
        cfg.apply_overrides(|key| match key {
            "POLYGON_API_KEY" => Some("k".to_string()),
            "TRADEPILOT_BIND_ADDR" => Some("127.0.0.1:9000".to_string()),
            "POLYGON_BASE_URL" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(cfg.polygon.api_key, "k");
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.polygon.base_url, "https://api.polygon.io");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(EngineConfig::load("/nonexistent/tradepilot_config.json").is_err());
    }
}
