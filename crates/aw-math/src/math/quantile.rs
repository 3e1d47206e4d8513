//! Empirical quantiles with linear interpolation.
//!
//! The estimator places the `q` quantile at position `h = (n - 1) q` of the
//! sorted sample and interpolates linearly between the two neighbouring
//! order statistics (Hyndman & Fan type 7).

use std::cmp::Ordering;

/// Empirical quantile of `data` at level `q` in `[0, 1]`.
///
/// Returns NaN for an empty sample or a level outside `[0, 1]`.
pub fn quantile(data: &[f64], q: f64) -> f64 {
    if data.is_empty() || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    let sorted = sorted_copy(data);
    quantile_sorted(&sorted, q)
}

/// Quantiles at several levels, sorting the sample only once.
pub fn quantiles(data: &[f64], levels: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return vec![f64::NAN; levels.len()];
    }
    let sorted = sorted_copy(data);
    levels
        .iter()
        .map(|&q| {
            if (0.0..=1.0).contains(&q) {
                quantile_sorted(&sorted, q)
            } else {
                f64::NAN
            }
        })
        .collect()
}

fn sorted_copy(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let idx = q * (n - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;

    if lo == hi || hi >= n {
        return sorted[lo.min(n - 1)];
    }

    let frac = idx - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_endpoints_and_median() {
        let data = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert!((quantile(&data, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile(&data, 0.5) - 3.0).abs() < 1e-12);
        assert!((quantile(&data, 1.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_interpolates() {
        let data = vec![0.0, 10.0];
        assert!((quantile(&data, 0.7) - 7.0).abs() < 1e-12);

        // h = 0.85 * 9 = 7.65 over 0..=9
        let data: Vec<f64> = (0..10).map(f64::from).collect();
        assert!((quantile(&data, 0.85) - 7.65).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_empty_is_nan() {
        assert!(quantile(&[], 0.5).is_nan());
        assert!(quantiles(&[], &[0.1, 0.2]).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_quantile_out_of_range_level() {
        assert!(quantile(&[1.0, 2.0], 1.5).is_nan());
    }

    #[test]
    fn test_quantiles_matches_single() {
        let data = vec![3.0, 0.0, 0.0, 7.0, 1.0, 12.0, 4.0];
        let levels = [0.70, 0.85, 0.92, 0.98];
        let batch = quantiles(&data, &levels);
        for (q, v) in levels.iter().zip(batch) {
            assert!((quantile(&data, *q) - v).abs() < 1e-12);
        }
    }
}
