// =============================================================================
// Layer 9 — Cross-layer Confirmation
// =============================================================================
//
// Votes from the momentum, volume and trend layers:
//   any BUY variant  => +1
//   any SELL variant => -1
//   NEUTRAL          =>  0
//
//   avg                 = mean of the available votes
//   confirmation_signal = trunc(avg * 2)          ∈ -2..=2
//   confidence          = |avg| * 100
//
// STRONG and plain variants vote the same, so conviction inside a layer does
// not carry through.
// =============================================================================

use serde::Serialize;

use super::{LayerAnalyzer, LayerId, LayerReport, LayerResults};
use crate::features::FeatureFrame;
use crate::indicators::round_to;
use crate::types::Signal;

const DEPENDENCIES: &[LayerId] = &[LayerId::Momentum, LayerId::Volume, LayerId::Trend];

/// Signals of the layers this one confirms. Missing layers do not vote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmationInputs {
    pub momentum: Option<Signal>,
    pub volume: Option<Signal>,
    pub trend: Option<Signal>,
}

impl ConfirmationInputs {
    pub fn from_results(results: &LayerResults) -> Self {
        Self {
            momentum: results.signal(LayerId::Momentum),
            volume: results.signal(LayerId::Volume),
            trend: results.signal(LayerId::Trend),
        }
    }

    fn votes(&self) -> Vec<i64> {
        [self.momentum, self.volume, self.trend]
            .into_iter()
            .flatten()
            .map(vote)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfirmationReport {
    pub confirmation_signal: i64,
    pub confidence: f64,
    pub signals_aligned: usize,
    pub signal: Signal,
}

/// Combine the dependent layers' signals into a confirmation verdict.
pub fn confirm(inputs: &ConfirmationInputs) -> ConfirmationReport {
    let votes = inputs.votes();
    if votes.is_empty() {
        return ConfirmationReport::default();
    }

    let avg = votes.iter().sum::<i64>() as f64 / votes.len() as f64;
    let confirmation_signal = (avg * 2.0).trunc() as i64;

    let signal = match confirmation_signal {
        s if s >= 2 => Signal::StrongBuy,
        1 => Signal::Buy,
        s if s <= -2 => Signal::StrongSell,
        -1 => Signal::Sell,
        _ => Signal::Neutral,
    };

    ConfirmationReport {
        confirmation_signal,
        confidence: round_to(avg.abs() * 100.0, 2),
        signals_aligned: votes.iter().filter(|v| **v != 0).count(),
        signal,
    }
}

fn vote(signal: Signal) -> i64 {
    match signal {
        Signal::StrongBuy | Signal::Buy => 1,
        Signal::StrongSell | Signal::Sell => -1,
        Signal::Neutral => 0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationAnalyzer;

impl LayerAnalyzer for ConfirmationAnalyzer {
    fn id(&self) -> LayerId {
        LayerId::Confirmation
    }

    fn dependencies(&self) -> &'static [LayerId] {
        DEPENDENCIES
    }

    fn analyze(&self, _frame: &FeatureFrame, prior: &LayerResults) -> LayerReport {
        LayerReport::Confirmation(confirm(&ConfirmationInputs::from_results(prior)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(m: Signal, v: Signal, t: Signal) -> ConfirmationInputs {
        ConfirmationInputs {
            momentum: Some(m),
            volume: Some(v),
            trend: Some(t),
        }
    }

    #[test]
    fn unanimous_buy_is_strong_buy() {
        let r = confirm(&inputs(Signal::Buy, Signal::StrongBuy, Signal::Buy));
        assert_eq!(r.confirmation_signal, 2);
        assert_eq!(r.confidence, 100.0);
        assert_eq!(r.signals_aligned, 3);
        assert_eq!(r.signal, Signal::StrongBuy);
    }

    #[test]
    fn two_of_three_is_plain_buy() {
        let r = confirm(&inputs(Signal::Buy, Signal::Neutral, Signal::StrongBuy));
        assert_eq!(r.confirmation_signal, 1);
        assert_eq!(r.confidence, 66.67);
        assert_eq!(r.signals_aligned, 2);
        assert_eq!(r.signal, Signal::Buy);
    }

    #[test]
    fn single_vote_truncates_to_neutral() {
        let r = confirm(&inputs(Signal::Sell, Signal::Neutral, Signal::Neutral));
        assert_eq!(r.confirmation_signal, 0);
        assert_eq!(r.confidence, 33.33);
        assert_eq!(r.signals_aligned, 1);
        assert_eq!(r.signal, Signal::Neutral);
    }

    #[test]
    fn unanimous_sell_is_strong_sell() {
        let r = confirm(&inputs(Signal::StrongSell, Signal::Sell, Signal::Sell));
        assert_eq!(r.confirmation_signal, -2);
        assert_eq!(r.signal, Signal::StrongSell);
    }

    #[test]
    fn conflicting_votes_cancel() {
        let r = confirm(&inputs(Signal::Buy, Signal::Sell, Signal::Neutral));
        assert_eq!(r.confirmation_signal, 0);
        assert_eq!(r.signals_aligned, 2);
        assert_eq!(r.signal, Signal::Neutral);
    }

    #[test]
    fn missing_layers_do_not_vote() {
        let r = confirm(&ConfirmationInputs {
            momentum: Some(Signal::Buy),
            ..ConfirmationInputs::default()
        });
        assert_eq!(r.confirmation_signal, 2);
        assert_eq!(r.signal, Signal::StrongBuy);

        let r = confirm(&ConfirmationInputs::default());
        assert_eq!(r, ConfirmationReport::default());
    }
}
