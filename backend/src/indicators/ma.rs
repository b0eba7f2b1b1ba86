// =============================================================================
// Rolling-window reductions (SMA, sum, highest, lowest)
// =============================================================================
//
// Trailing (right-aligned) windows.  The value at index `i` covers
// `values[i + 1 - window ..= i]` and is only defined once the window is full
// and every element in it is defined, mirroring a strict `min_periods` rule.

use super::{finite, Series};

/// Apply `reduce` to every full trailing window of `values`.
pub fn rolling<F>(values: &[Option<f64>], window: usize, reduce: F) -> Series
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let mut buf = Vec::with_capacity(window);
    for end in window..=values.len() {
        buf.clear();
        buf.extend(values[end - window..end].iter().flatten());
        if buf.len() == window {
            out[end - 1] = finite(reduce(&buf));
        }
    }
    out
}

/// Simple moving average.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Series {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_sum(values: &[Option<f64>], window: usize) -> Series {
    rolling(values, window, |w| w.iter().sum())
}

pub fn rolling_max(values: &[Option<f64>], window: usize) -> Series {
    rolling(values, window, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn rolling_min(values: &[Option<f64>], window: usize) -> Series {
    rolling(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Arithmetic moving average of a fully-defined column (usually closes).
pub fn sma(values: &[f64], window: usize) -> Series {
    rolling_mean(&super::lift(values), window)
}

/// Centered rolling maximum: index `i` covers `values[i - half ..= i + half]`.
///
/// Only the bars with `half` neighbours on both sides are defined, so the
/// newest defined value is always `half` bars behind the end of the series.
pub fn centered_max(values: &[f64], half: usize) -> Series {
    centered(values, half, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn centered_min(values: &[f64], half: usize) -> Series {
    centered(values, half, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

fn centered<F>(values: &[f64], half: usize, reduce: F) -> Series
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    let mut out = vec![None; n];
    let width = 2 * half + 1;
    if n < width {
        return out;
    }
    for center in half..n - half {
        out[center] = finite(reduce(&values[center - half..=center + half]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup_is_undefined() {
        let values: Vec<f64> = (1..=5).map(|x| x as f64).collect();
        let ma = sma(&values, 3);
        assert_eq!(ma[0], None);
        assert_eq!(ma[1], None);
        assert_eq!(ma[2], Some(2.0));
        assert_eq!(ma[4], Some(4.0));
    }

    #[test]
    fn undefined_element_poisons_window() {
        let values = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let s = rolling_sum(&values, 2);
        assert_eq!(s[1], None);
        assert_eq!(s[2], None);
        assert_eq!(s[3], Some(7.0));
    }

    #[test]
    fn window_longer_than_series() {
        let s = rolling_mean(&[Some(1.0), Some(2.0)], 5);
        assert!(s.iter().all(Option::is_none));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn rolling_extremes() {
        let values = vec![Some(3.0), Some(1.0), Some(4.0), Some(1.0), Some(5.0)];
        assert_eq!(rolling_max(&values, 3)[4], Some(5.0));
        assert_eq!(rolling_min(&values, 3)[3], Some(1.0));
    }

    #[test]
    fn centered_window_lags_by_half() {
        let values: Vec<f64> = (0..11).map(|x| x as f64).collect();
        let hi = centered_max(&values, 2);
        assert_eq!(hi[1], None);
        assert_eq!(hi[2], Some(4.0));
        assert_eq!(hi[8], Some(10.0));
        assert_eq!(hi[9], None);
        assert_eq!(centered_min(&values, 2)[8], Some(6.0));
    }
}
