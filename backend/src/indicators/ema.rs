// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Recursive smoothing without bias-corrected warm-up:
//
//   alpha  = 2 / (span + 1)
//   EMA_0  = x_0                       (first defined value)
//   EMA_t  = alpha * x_t + (1 - alpha) * EMA_{t-1}
//
// Leading undefined inputs produce undefined outputs; an undefined input after
// seeding carries the previous EMA forward.
// =============================================================================

use super::{finite, Series};

/// Compute the bar-aligned EMA series of `values` for the given `span`.
///
/// # Edge cases
/// - `span == 0` => every value undefined.
/// - A non-finite intermediate resets the recursion; the next defined input
///   re-seeds it.
pub fn ema(values: &[Option<f64>], span: usize) -> Series {
    if span == 0 {
        return vec![None; values.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    values
        .iter()
        .map(|value| {
            prev = match (prev, *value) {
                (None, Some(x)) => finite(x),
                (Some(p), Some(x)) => finite(alpha * x + (1.0 - alpha) * p),
                (p, None) => p,
            };
            prev
        })
        .collect()
}
