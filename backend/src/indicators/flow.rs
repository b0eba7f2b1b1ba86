// =============================================================================
// Volume flow lines — CMF, On-Balance Volume, Accumulation/Distribution
// =============================================================================
//
//   multiplier = ((close - low) - (high - close)) / (high - low)   (0 if h == l)
//   CMF        = sum(multiplier * volume, n) / sum(volume, n)
//   OBV_t      = OBV_{t-1} + sign(close_t - close_{t-1}) * volume_t
//   A/D_t      = A/D_{t-1} + multiplier_t * volume_t              (never reset)
// =============================================================================

use super::ma::rolling_sum;
use super::{lift, safe_div, Series};

/// Chaikin money-flow multiplier for one bar. Zero-range bars read as 0.
pub fn money_flow_multiplier(high: f64, low: f64, close: f64) -> f64 {
    let range = high - low;
    if range == 0.0 {
        return 0.0;
    }
    let m = ((close - low) - (high - close)) / range;
    if m.is_finite() {
        m
    } else {
        0.0
    }
}

fn money_flow_volume(highs: &[f64], lows: &[f64], closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    (0..closes.len())
        .map(|i| money_flow_multiplier(highs[i], lows[i], closes[i]) * volumes[i])
        .collect()
}

/// Chaikin Money Flow over a trailing `period`.
pub fn cmf(highs: &[f64], lows: &[f64], closes: &[f64], volumes: &[f64], period: usize) -> Series {
    let mfv = rolling_sum(&lift(&money_flow_volume(highs, lows, closes, volumes)), period);
    let vol = rolling_sum(&lift(volumes), period);

    mfv.iter()
        .zip(vol.iter())
        .map(|(f, v)| safe_div((*f)?, (*v)?))
        .collect()
}

/// On-Balance Volume. The first bar has no prior close and contributes 0.
pub fn obv(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            if i > 0 {
                let delta = close - closes[i - 1];
                if delta > 0.0 {
                    total += volumes[i];
                } else if delta < 0.0 {
                    total -= volumes[i];
                }
            }
            total
        })
        .collect()
}

/// Accumulation/Distribution line.
pub fn ad_line(highs: &[f64], lows: &[f64], closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    money_flow_volume(highs, lows, closes, volumes)
        .into_iter()
        .map(|mfv| {
            total += mfv;
            total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_extremes() {
        assert_eq!(money_flow_multiplier(10.0, 0.0, 10.0), 1.0);
        assert_eq!(money_flow_multiplier(10.0, 0.0, 0.0), -1.0);
        assert_eq!(money_flow_multiplier(10.0, 0.0, 5.0), 0.0);
    }

    #[test]
    fn multiplier_zero_range_is_zero_not_nan() {
        assert_eq!(money_flow_multiplier(7.0, 7.0, 7.0), 0.0);
    }

    #[test]
    fn cmf_all_closes_at_high() {
        let highs = vec![11.0; 25];
        let lows = vec![9.0; 25];
        let closes = vec![11.0; 25];
        let volumes = vec![500.0; 25];
        let c = cmf(&highs, &lows, &closes, &volumes, 20);
        assert!(c[18].is_none());
        assert!((c[24].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cmf_zero_volume_is_undefined() {
        let v = vec![0.0; 25];
        let p = vec![1.0; 25];
        assert!(cmf(&p, &p, &p, &v, 20).iter().all(Option::is_none));
    }

    #[test]
    fn obv_signs_volume() {
        let closes = vec![10.0, 11.0, 10.5, 10.5, 12.0];
        let volumes = vec![100.0, 200.0, 50.0, 70.0, 10.0];
        assert_eq!(obv(&closes, &volumes), vec![0.0, 200.0, 150.0, 150.0, 160.0]);
    }

    #[test]
    fn ad_line_accumulates() {
        let highs = vec![10.0, 10.0];
        let lows = vec![0.0, 0.0];
        let closes = vec![10.0, 0.0];
        let volumes = vec![5.0, 2.0];
        assert_eq!(ad_line(&highs, &lows, &closes, &volumes), vec![5.0, 3.0]);
    }
}
