// =============================================================================
// Analysis Engine — one batch transform per call
// =============================================================================
//
// Pipeline:
//   1. Derive the shared feature frame from the bar series.
//   2. Stage A: every analyzer without dependencies, in registry order.
//   3. Stage B: analyzers that read earlier reports (confirmation).
//   4. Stage C: weighted aggregation into the overall signal.
//
// The engine holds only read-only configuration, so one instance is shared by
// all concurrent requests.  Nothing inside the pipeline can fail: short
// history or degenerate bars surface as undefined fields and NEUTRAL signals.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::features::FeatureFrame;
use crate::layers::{self, LayerAnalyzer, LayerId, LayerReport, LayerResults, VolatilityRegime};
use crate::market_data::BarSeries;
use crate::signals::{OverallSignal, SignalAggregator};
use crate::types::{Direction, Recommendation, Signal};

/// Full output of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub timeframe: String,
    pub bars_analyzed: usize,
    pub latest_price: Option<f64>,
    pub latest_datetime: Option<String>,
    pub layers: LayerResults,
    pub overall_signal: OverallSignal,
}

/// Condensed projection of an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSummary {
    pub symbol: String,
    pub latest_price: Option<f64>,
    pub momentum_bias: Option<Signal>,
    pub momentum_score: Option<f64>,
    pub trend_direction: Option<Direction>,
    /// ADX of the trend layer.
    pub trend_strength: Option<f64>,
    pub volume_flow: Option<f64>,
    pub volatility_regime: Option<VolatilityRegime>,
    pub structure_bias: Option<Direction>,
    pub confirmation_signal: Option<Signal>,
    pub overall_signal: Direction,
    pub overall_confidence: f64,
    pub recommendation: Recommendation,
}

impl From<&AnalysisResult> for SignalSummary {
    fn from(result: &AnalysisResult) -> Self {
        let layers = &result.layers;
        let momentum = layers.momentum();
        let trend = layers.trend();

        Self {
            symbol: result.symbol.clone(),
            latest_price: result.latest_price,
            momentum_bias: momentum.map(|m| m.signal),
            momentum_score: momentum.and_then(|m| m.momentum_score),
            trend_direction: trend.map(|t| t.trend_direction),
            trend_strength: trend.and_then(|t| t.adx),
            volume_flow: layers.volume().map(|v| v.volume_flow_score),
            volatility_regime: layers.volatility_regime().map(|v| v.regime),
            structure_bias: layers.structure().map(|s| s.bias),
            confirmation_signal: layers.confirmation().map(|c| c.signal),
            overall_signal: result.overall_signal.direction,
            overall_confidence: result.overall_signal.confidence,
            recommendation: result.overall_signal.recommendation,
        }
    }
}

/// One layer's report with its request context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerProjection {
    pub symbol: String,
    pub timeframe: String,
    pub layer: LayerId,
    pub result: Option<LayerReport>,
}

pub struct AnalysisEngine {
    analyzers: Vec<Box<dyn LayerAnalyzer>>,
    aggregator: SignalAggregator,
}

impl AnalysisEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            analyzers: layers::registry(&config.indicators),
            aggregator: SignalAggregator::new(config.weights),
        }
    }

    /// Layer ids in registry order.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.analyzers.iter().map(|a| a.id()).collect()
    }

    /// Run every layer and the aggregator over `series`.
    pub fn analyze(&self, series: &BarSeries, symbol: &str, timeframe: &str) -> AnalysisResult {
        let frame = FeatureFrame::derive(series);
        let mut results = LayerResults::new();

        // Stage A
        for analyzer in self.analyzers.iter().filter(|a| a.dependencies().is_empty()) {
            let report = analyzer.analyze(&frame, &results);
            debug!(layer = %analyzer.id(), signal = %report.signal(), "layer complete");
            results.insert(analyzer.id(), report);
        }

        // Stage B
        for analyzer in self.analyzers.iter().filter(|a| !a.dependencies().is_empty()) {
            let report = analyzer.analyze(&frame, &results);
            debug!(layer = %analyzer.id(), signal = %report.signal(), "layer complete");
            results.insert(analyzer.id(), report);
        }
        results.sort_by_layer();

        // Stage C
        let overall_signal = self.aggregator.aggregate(&results);

        let latest = series.latest();
        let result = AnalysisResult {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            bars_analyzed: series.len(),
            latest_price: latest.map(|b| b.close),
            latest_datetime: latest.and_then(|b| format_timestamp(b.timestamp)),
            layers: results,
            overall_signal,
        };

        info!(
            symbol,
            timeframe,
            bars = result.bars_analyzed,
            layers = result.layers.len(),
            direction = %result.overall_signal.direction,
            confidence = result.overall_signal.confidence,
            "analysis complete"
        );

        result
    }

    pub fn summary(&self, series: &BarSeries, symbol: &str, timeframe: &str) -> SignalSummary {
        SignalSummary::from(&self.analyze(series, symbol, timeframe))
    }

    /// Run the full pipeline and keep only `layer`.
    pub fn layer(
        &self,
        series: &BarSeries,
        symbol: &str,
        timeframe: &str,
        layer: LayerId,
    ) -> LayerProjection {
        let result = self.analyze(series, symbol, timeframe);
        LayerProjection {
            result: result.layers.get(layer).cloned(),
            symbol: result.symbol,
            timeframe: result.timeframe,
            layer,
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
fn format_timestamp(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}
