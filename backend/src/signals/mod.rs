// =============================================================================
// Signals Module
// =============================================================================
//
// Combines individual layer verdicts into the overall directional signal.

pub mod aggregator;

pub use aggregator::{OverallSignal, SignalAggregator};
