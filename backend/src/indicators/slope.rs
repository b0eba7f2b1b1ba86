// =============================================================================
// Linear trend slope
// =============================================================================
//
// Ordinary least-squares slope of `y` against its index `x = 0..n`:
//   slope = sum((x - x̄)(y - ȳ)) / sum((x - x̄)²)

use super::finite;

/// Least-squares slope of `values` against bar index. `None` for fewer than
/// two points or non-finite input.
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n_f;

    let (num, den) = values.iter().enumerate().fold((0.0, 0.0), |(num, den), (i, &y)| {
        let dx = i as f64 - x_mean;
        (num + dx * (y - y_mean), den + dx * dx)
    });

    finite(num / den)
}

/// Slope over the trailing `window` values; `None` when history is shorter.
pub fn trailing_slope(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    linear_slope(&values[values.len() - window..])
}
