//! Sample moments used to seed distribution fits.

/// Arithmetic mean. Returns NaN for an empty sample.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with Bessel's correction (ddof = 1).
///
/// Returns NaN when fewer than two values are present.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Biased sample skewness `m3 / m2^1.5` computed from population moments.
///
/// Returns 0.0 for constant samples and NaN for an empty sample.
pub fn skewness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    if m2 <= 0.0 {
        return 0.0;
    }
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    m3 / m2.powf(1.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_simple_sample() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn sample_std_uses_bessel_correction() {
        // Variance with ddof=1 of [2,4,4,4,5,5,7,9] is 32/7.
        let s = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((s - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn skewness_sign() {
        assert!(skewness(&[1.0, 1.0, 1.0, 2.0, 10.0]) > 0.0);
        assert!(skewness(&[-10.0, -2.0, -1.0, -1.0, -1.0]) < 0.0);
        assert_eq!(skewness(&[3.0, 3.0, 3.0]), 0.0);
    }
}
