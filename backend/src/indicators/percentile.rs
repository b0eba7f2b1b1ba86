// =============================================================================
// Percentile ranking
// =============================================================================
//
// Percentiles use linear interpolation between closest ranks:
//   rank = q / 100 * (n - 1)
//   p    = sorted[floor(rank)] + (sorted[ceil(rank)] - sorted[floor(rank)]) * frac(rank)
//
// A value is bucketed against the 20/40/60/80th percentiles with inclusive
// upper edges (value <= p20 is bucket 0, value > p80 is bucket 4).

/// Linear-interpolated percentile of an already sorted sample.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Quintile boundaries of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileBands {
    pub p20: f64,
    pub p40: f64,
    pub p60: f64,
    pub p80: f64,
}

impl PercentileBands {
    /// Compute bands from an unsorted sample. `None` for an empty sample.
    pub fn from_sample(sample: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            p20: percentile(&sorted, 20.0)?,
            p40: percentile(&sorted, 40.0)?,
            p60: percentile(&sorted, 60.0)?,
            p80: percentile(&sorted, 80.0)?,
        })
    }

    /// Ordered bucket index in `0..=4`.
    pub fn bucket(&self, value: f64) -> usize {
        if value <= self.p20 {
            0
        } else if value <= self.p40 {
            1
        } else if value <= self.p60 {
            2
        } else if value <= self.p80 {
            3
        } else {
            4
        }
    }
}
