// =============================================================================
// Layer 1 — Momentum
// =============================================================================
//
// Five sub-scores on a -100..+100 scale, averaged into `momentum_score`:
//
//   rsi_momentum    (RSI - 50) / 50 * 100
//   macd_momentum   ±100 * |hist| / max(|hist| over the last 100 bars)
//   stoch_momentum  (%K - 50) / 50 * 100
//   trend_momentum  +ADX when +DI > -DI, else -ADX
//   cmf_momentum    CMF * 100 (0 when CMF is undefined)
//
// Signal:
//   STRONG_BUY   score > 50, DMI bullish, ADX > 25, price above the cloud
//   BUY          score > 20, DMI bullish
//   (mirror image for SELL / STRONG_SELL), otherwise NEUTRAL.
//
// Any undefined sub-score leaves `momentum_score` undefined, which in turn
// yields NEUTRAL.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::config::MomentumParams;
use crate::features::FeatureFrame;
use crate::indicators::ma::rolling_max;
use crate::indicators::{adx, flow, ichimoku, last, macd, round_opt, round_to, rsi, safe_div, stochastic};
use crate::types::{Direction, Signal, Strength};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentumReport {
    pub momentum_score: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_momentum: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub macd_momentum: Option<f64>,
    pub stochastic_k: Option<f64>,
    pub stochastic_d: Option<f64>,
    pub stoch_momentum: Option<f64>,
    pub cmf: Option<f64>,
    pub cmf_momentum: f64,
    pub adx: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub trend_strength: Strength,
    pub trend_direction: Direction,
    pub trend_momentum: Option<f64>,
    pub ichimoku_conv: Option<f64>,
    pub ichimoku_base: Option<f64>,
    pub ichimoku_lead1: Option<f64>,
    pub ichimoku_lead2: Option<f64>,
    pub cloud_trend: Direction,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct MomentumAnalyzer {
    params: MomentumParams,
}

impl MomentumAnalyzer {
    pub fn new(params: MomentumParams) -> Self {
        Self { params }
    }

    pub fn report(&self, frame: &FeatureFrame) -> MomentumReport {
        let p = &self.params;

        let rsi_series = rsi::rsi(&frame.close, p.rsi_length);
        let macd_lines = macd::macd(&frame.close, p.macd_fast, p.macd_slow, p.macd_signal);
        let stoch = stochastic::stochastic(
            &frame.high,
            &frame.low,
            &frame.close,
            p.stoch_length,
            p.stoch_smooth,
        );
        let cmf_series = flow::cmf(&frame.high, &frame.low, &frame.close, &frame.volume, p.cmf_length);
        let dmi = adx::dmi(&frame.high, &frame.low, &frame.true_range, p.adx_length);
        let ich = ichimoku::ichimoku(
            &frame.high,
            &frame.low,
            p.ichimoku_conv,
            p.ichimoku_base,
            p.ichimoku_span,
        );

        let rsi_now = last(&rsi_series);
        let k_now = last(&stoch.k);
        let cmf_now = last(&cmf_series);
        let adx_now = last(&dmi.adx);
        let bullish_dmi = dmi.latest_bullish();

        let rsi_momentum = rsi_now.map(|r| (r - 50.0) / 50.0 * 100.0);
        let macd_momentum = macd_momentum(&macd_lines.histogram, p.macd_norm_window);
        let stoch_momentum = k_now.map(|k| (k - 50.0) / 50.0 * 100.0);
        let trend_momentum = adx_now.map(|a| if bullish_dmi { a } else { -a });
        let cmf_momentum = cmf_now.map_or(0.0, |c| c * 100.0);

        let momentum_score = match (rsi_momentum, macd_momentum, stoch_momentum, trend_momentum) {
            (Some(r), Some(m), Some(s), Some(t)) => Some((r + m + s + t + cmf_momentum) / 5.0),
            _ => None,
        };

        let trend_direction = if bullish_dmi {
            Direction::Bullish
        } else {
            Direction::Bearish
        };

        let price = frame.close.last().copied().unwrap_or(f64::NAN);
        let cloud_trend = ichimoku::cloud_trend(price, last(&ich.span_a), last(&ich.span_b));

        let signal = momentum_signal(momentum_score, trend_direction, adx_now, cloud_trend);

        MomentumReport {
            momentum_score: round_opt(momentum_score, 2),
            rsi: round_opt(rsi_now, 2),
            rsi_momentum: round_opt(rsi_momentum, 2),
            macd: round_opt(last(&macd_lines.macd), 4),
            macd_signal: round_opt(last(&macd_lines.signal), 4),
            macd_hist: round_opt(last(&macd_lines.histogram), 4),
            macd_momentum: round_opt(macd_momentum, 2),
            stochastic_k: round_opt(k_now, 2),
            stochastic_d: round_opt(last(&stoch.d), 2),
            stoch_momentum: round_opt(stoch_momentum, 2),
            cmf: round_opt(cmf_now, 4),
            cmf_momentum: round_to(cmf_momentum, 2),
            adx: round_opt(adx_now, 2),
            plus_di: round_opt(last(&dmi.plus_di), 2),
            minus_di: round_opt(last(&dmi.minus_di), 2),
            trend_strength: Strength::from_adx(adx_now),
            trend_direction,
            trend_momentum: round_opt(trend_momentum, 2),
            ichimoku_conv: round_opt(last(&ich.conversion), 2),
            ichimoku_base: round_opt(last(&ich.base), 2),
            ichimoku_lead1: round_opt(last(&ich.span_a), 2),
            ichimoku_lead2: round_opt(last(&ich.span_b), 2),
            cloud_trend,
            signal,
        }
    }
}

impl LayerAnalyzer for MomentumAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::Momentum
    }

    fn analyze(&self, frame: &FeatureFrame, _prior: &LayerResults) -> LayerReport {
        LayerReport::Momentum(self.report(frame))
    }
}

/// Latest histogram bar scaled against the largest |histogram| in the
/// trailing `window`.
fn macd_momentum(histogram: &[Option<f64>], window: usize) -> Option<f64> {
    let magnitudes: Vec<Option<f64>> = histogram.iter().map(|h| h.map(f64::abs)).collect();
    let max_hist = last(&rolling_max(&magnitudes, window))?;
    let current = last(histogram)?;

    if max_hist == 0.0 {
        return Some(0.0);
    }
    if current > 0.0 {
        safe_div(100.0 * current, max_hist)
    } else {
        safe_div(-100.0 * current.abs(), max_hist)
    }
}

fn momentum_signal(
    score: Option<f64>,
    trend: Direction,
    adx: Option<f64>,
    cloud: Direction,
) -> Signal {
    let Some(score) = score else {
        return Signal::Neutral;
    };
    let trending = adx.is_some_and(|a| a > 25.0);

    if score > 50.0 && trend == Direction::Bullish && trending && cloud == Direction::Bullish {
        Signal::StrongBuy
    } else if score > 20.0 && trend == Direction::Bullish {
        Signal::Buy
    } else if score < -50.0 && trend == Direction::Bearish && trending && cloud == Direction::Bearish {
        Signal::StrongSell
    } else if score < -20.0 && trend == Direction::Bearish {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::test_support::{falling, flat, rising};

    fn analyze(series: &crate::market_data::BarSeries) -> MomentumReport {
        let frame = FeatureFrame::derive(series);
        MomentumAnalyzer::new(MomentumParams::default()).report(&frame)
    }

    #[test]
    fn rising_series_is_strong_buy() {
        let r = analyze(&rising(250));
        assert_eq!(r.rsi, Some(100.0));
        assert_eq!(r.rsi_momentum, Some(100.0));
        assert_eq!(r.trend_direction, Direction::Bullish);
        assert_eq!(r.cloud_trend, Direction::Bullish);
        assert_eq!(r.trend_strength, Strength::Strong);
        assert_eq!(r.adx, Some(100.0));
        assert_eq!(r.cmf, Some(0.5));
        assert!(r.momentum_score.unwrap() > 50.0);
        assert_eq!(r.signal, Signal::StrongBuy);
    }

    #[test]
    fn falling_series_is_strong_sell() {
        let r = analyze(&falling(250));
        assert_eq!(r.rsi, Some(0.0));
        assert_eq!(r.trend_direction, Direction::Bearish);
        assert_eq!(r.cloud_trend, Direction::Bearish);
        assert!(r.momentum_score.unwrap() < -50.0);
        assert_eq!(r.signal, Signal::StrongSell);
    }

    #[test]
    fn short_history_degrades_to_neutral() {
        let r = analyze(&rising(20));
        assert!(r.rsi.is_some());
        assert_eq!(r.adx, None);
        assert_eq!(r.ichimoku_lead2, None);
        assert_eq!(r.momentum_score, None);
        assert_eq!(r.signal, Signal::Neutral);
    }

    #[test]
    fn flat_series_does_not_fail() {
        let r = analyze(&flat(250));
        assert_eq!(r.stochastic_k, None);
        assert_eq!(r.adx, None);
        assert_eq!(r.cmf, Some(0.0));
        assert_eq!(r.macd_momentum, Some(0.0));
        assert_eq!(r.trend_strength, Strength::Weak);
        assert_eq!(r.signal, Signal::Neutral);
    }

    #[test]
    fn macd_momentum_scales_against_window_max() {
        let hist = vec![Some(-4.0), Some(2.0), Some(1.0)];
        assert_eq!(macd_momentum(&hist, 3), Some(25.0));
        let hist = vec![Some(1.0), Some(-2.0)];
        assert_eq!(macd_momentum(&hist, 2), Some(-100.0));
        assert_eq!(macd_momentum(&hist, 5), None);
    }
}
