//! Generalized Extreme Value (GEV) distribution and maximum-likelihood fitting.
//!
//! # Parameterization
//!
//! Uses the shape convention `c = -ξ` (the sign used by most numerical
//! libraries for this family):
//!
//! ```text
//! z = (x - loc) / scale
//! F(x) = exp(-(1 - c z)^(1/c))     for c ≠ 0, support 1 - c z > 0
//!      = exp(-exp(-z))             for c = 0 (Gumbel)
//! ```
//!
//! - `c > 0`: bounded upper tail (Weibull type)
//! - `c = 0`: light exponential tail (Gumbel)
//! - `c < 0`: heavy upper tail (Fréchet type)
//!
//! # Fitting
//!
//! [`fit_mle`] minimises the penalised negative log-likelihood with the
//! Nelder–Mead simplex. Observations outside the support of a candidate
//! parameter vector do not make the objective infinite; each contributes a
//! large fixed penalty instead, which keeps the simplex moving back toward
//! feasible parameters.

use serde::Serialize;
use thiserror::Error;

use super::moments::skewness;
use super::optimize::{nelder_mead, NelderMeadOptions};

/// Shapes with `|c|` below this use the Gumbel limit formulas.
const SHAPE_EPS: f64 = 1e-12;

/// Penalty per out-of-support observation: `100 * ln(f64::MAX)`.
const OUT_OF_SUPPORT_PENALTY: f64 = 100.0 * 709.782_712_893_384;

/// Errors from GEV fitting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("empty sample")]
    EmptySample,

    #[error("sample contains non-finite values")]
    NonFiniteSample,

    #[error("degenerate starting point: loc={loc}, scale={scale}")]
    DegenerateStart { loc: f64, scale: f64 },

    #[error("optimum is not finite after {iterations} iterations")]
    NonFiniteOptimum { iterations: usize },

    #[error("optimizer converged outside the parameter space: scale={scale}")]
    OutOfRange { scale: f64 },
}

/// A GEV distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gev {
    /// Shape `c` (`c = -ξ`).
    pub shape: f64,
    /// Location.
    pub loc: f64,
    /// Scale (> 0).
    pub scale: f64,
}

impl Gev {
    pub fn new(shape: f64, loc: f64, scale: f64) -> Self {
        Self { shape, loc, scale }
    }

    fn is_gumbel(&self) -> bool {
        self.shape.abs() < SHAPE_EPS
    }

    /// Log density at `x`. `-inf` outside the support.
    pub fn log_pdf(&self, x: f64) -> f64 {
        if x.is_nan() || !valid_scale(self.scale) {
            return f64::NAN;
        }
        standard_log_pdf((x - self.loc) / self.scale, self.shape) - self.scale.ln()
    }

    /// Cumulative distribution function.
    pub fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() || !valid_scale(self.scale) {
            return f64::NAN;
        }
        let z = (x - self.loc) / self.scale;
        if self.is_gumbel() {
            return (-(-z).exp()).exp();
        }
        let t = 1.0 - self.shape * z;
        if t <= 0.0 {
            // Beyond the finite endpoint.
            return if self.shape > 0.0 { 1.0 } else { 0.0 };
        }
        (-(t.ln() / self.shape).exp()).exp()
    }

    /// Quantile function (inverse CDF) for `p` in `[0, 1]`.
    pub fn ppf(&self, p: f64) -> f64 {
        if p.is_nan() || !(0.0..=1.0).contains(&p) || !valid_scale(self.scale) {
            return f64::NAN;
        }
        // Reduced variate y = -ln(-ln p).
        let y = -(-p.ln()).ln();
        let z = if self.is_gumbel() {
            y
        } else {
            -(-self.shape * y).exp_m1() / self.shape
        };
        self.loc + self.scale * z
    }

    /// Central interval containing probability mass `confidence`.
    ///
    /// Returns `(ppf((1 - confidence) / 2), ppf((1 + confidence) / 2))`.
    pub fn interval(&self, confidence: f64) -> (f64, f64) {
        if !(0.0..=1.0).contains(&confidence) {
            return (f64::NAN, f64::NAN);
        }
        let tail = (1.0 - confidence) / 2.0;
        (self.ppf(tail), self.ppf(1.0 - tail))
    }

    /// Penalised negative log-likelihood of `samples`.
    ///
    /// Returns `+inf` when the scale is not positive.
    pub fn penalized_nll(&self, samples: &[f64]) -> f64 {
        penalized_nll(self.shape, self.loc, self.scale, samples)
    }
}

/// Log density of the standard GEV (`loc = 0`, `scale = 1`).
fn standard_log_pdf(z: f64, c: f64) -> f64 {
    if c.abs() < SHAPE_EPS {
        return -z - (-z).exp();
    }
    let t = 1.0 - c * z;
    if t <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let log_t = t.ln();
    let log_t_over_c = log_t / c;
    -log_t_over_c.exp() + log_t_over_c - log_t
}

fn valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

fn in_support(z: f64, c: f64) -> bool {
    if c.abs() < SHAPE_EPS {
        z.is_finite()
    } else {
        1.0 - c * z > 0.0
    }
}

fn penalized_nll(c: f64, loc: f64, scale: f64, samples: &[f64]) -> f64 {
    if !c.is_finite() || !loc.is_finite() || !valid_scale(scale) {
        return f64::INFINITY;
    }
    let n_log_scale = samples.len() as f64 * scale.ln();
    let mut n_bad = 0usize;
    let mut total = 0.0;
    for &x in samples {
        let z = (x - loc) / scale;
        if !in_support(z, c) {
            n_bad += 1;
            continue;
        }
        let lp = standard_log_pdf(z, c);
        if lp.is_finite() {
            total -= lp;
        } else {
            n_bad += 1;
        }
    }
    total + n_bad as f64 * OUT_OF_SUPPORT_PENALTY + n_log_scale
}

/// Outcome of [`fit_mle`].
#[derive(Debug, Clone, Serialize)]
pub struct GevFit {
    /// Fitted distribution.
    pub dist: Gev,
    /// Negative log-likelihood at the optimum (penalty included).
    pub nll: f64,
    /// Simplex iterations used.
    pub iterations: usize,
    /// Whether the simplex met its tolerances within budget.
    pub converged: bool,
}

/// Maximum-likelihood fit of a GEV to `samples`.
///
/// `loc0` and `scale0` seed the location and scale. The shape is seeded
/// with `+0.5` for negatively skewed samples and `-0.5` otherwise.
/// An exhausted iteration budget is not an error: the best vertex is
/// returned with `converged = false`.
pub fn fit_mle(samples: &[f64], loc0: f64, scale0: f64) -> Result<GevFit, FitError> {
    if samples.is_empty() {
        return Err(FitError::EmptySample);
    }
    if samples.iter().any(|x| !x.is_finite()) {
        return Err(FitError::NonFiniteSample);
    }
    if !loc0.is_finite() || !scale0.is_finite() || scale0 <= 0.0 {
        return Err(FitError::DegenerateStart {
            loc: loc0,
            scale: scale0,
        });
    }

    let c0 = if skewness(samples) < 0.0 { 0.5 } else { -0.5 };
    let objective = |theta: &[f64]| penalized_nll(theta[0], theta[1], theta[2], samples);
    let min = nelder_mead(objective, &[c0, loc0, scale0], &NelderMeadOptions::default());

    if !min.value.is_finite() {
        return Err(FitError::NonFiniteOptimum {
            iterations: min.iterations,
        });
    }

    let (shape, loc, scale) = (min.x[0], min.x[1], min.x[2]);
    if !valid_scale(scale) || !shape.is_finite() || !loc.is_finite() {
        return Err(FitError::OutOfRange { scale });
    }

    Ok(GevFit {
        dist: Gev::new(shape, loc, scale),
        nll: min.value,
        iterations: min.iterations,
        converged: min.converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gumbel_quantile_sample(n: usize, loc: f64, scale: f64) -> Vec<f64> {
        let d = Gev::new(0.0, loc, scale);
        (0..n).map(|i| d.ppf((i as f64 + 0.5) / n as f64)).collect()
    }

    #[test]
    fn test_gumbel_cdf_known_value() {
        let d = Gev::new(0.0, 0.0, 1.0);
        assert!((d.cdf(0.0) - (-1.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_ppf_inverts_cdf() {
        for &c in &[-0.3, 0.0, 0.2] {
            let d = Gev::new(c, 10.0, 3.0);
            for &p in &[0.05, 0.5, 0.85, 0.99] {
                let x = d.ppf(p);
                assert!((d.cdf(x) - p).abs() < 1e-9, "c={} p={} x={}", c, p, x);
            }
        }
    }

    #[test]
    fn test_small_shape_approaches_gumbel() {
        let g = Gev::new(0.0, 5.0, 2.0);
        let near = Gev::new(1e-9, 5.0, 2.0);
        assert!((g.ppf(0.9) - near.ppf(0.9)).abs() < 1e-6);
    }

    #[test]
    fn test_interval_is_symmetric_in_mass() {
        let d = Gev::new(-0.1, 100.0, 20.0);
        let (lo, hi) = d.interval(0.9);
        assert!((d.cdf(lo) - 0.05).abs() < 1e-9);
        assert!((d.cdf(hi) - 0.95).abs() < 1e-9);
        let (lo, hi) = d.interval(0.0);
        assert!((lo - hi).abs() < 1e-9);
    }

    #[test]
    fn test_interval_upper_increases_with_confidence() {
        let d = Gev::new(0.1, 50.0, 10.0);
        let mut prev = f64::NEG_INFINITY;
        for q in [0.70, 0.85, 0.92, 0.98] {
            let (_, hi) = d.interval(q);
            assert!(hi > prev);
            prev = hi;
        }
    }

    #[test]
    fn test_log_pdf_outside_support() {
        // c > 0 has an upper endpoint at loc + scale / c = 10 + 2 / 0.5 = 14.
        let d = Gev::new(0.5, 10.0, 2.0);
        assert_eq!(d.log_pdf(20.0), f64::NEG_INFINITY);
        assert!(d.log_pdf(11.0).is_finite());
        assert_eq!(d.cdf(20.0), 1.0);
    }

    #[test]
    fn test_penalized_nll_rejects_bad_scale() {
        assert_eq!(penalized_nll(0.0, 0.0, 0.0, &[1.0]), f64::INFINITY);
        assert_eq!(penalized_nll(0.0, 0.0, -1.0, &[1.0]), f64::INFINITY);
    }

    #[test]
    fn test_penalized_nll_counts_out_of_support() {
        let d = Gev::new(0.5, 10.0, 2.0);
        let inside = d.penalized_nll(&[11.0]);
        let outside = d.penalized_nll(&[11.0, 50.0]);
        assert!(outside - inside > OUT_OF_SUPPORT_PENALTY * 0.99);
    }

    #[test]
    fn test_fit_recovers_gumbel_parameters() {
        let samples = gumbel_quantile_sample(400, 50.0, 8.0);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let fit = fit_mle(&samples, mean, 10.0).expect("fit");
        assert!(fit.dist.shape.abs() < 0.2, "shape = {}", fit.dist.shape);
        assert!((fit.dist.loc - 50.0).abs() < 4.0, "loc = {}", fit.dist.loc);
        assert!((fit.dist.scale - 8.0).abs() < 3.0, "scale = {}", fit.dist.scale);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let samples = gumbel_quantile_sample(60, 20.0, 4.0);
        let a = fit_mle(&samples, 22.0, 5.0).unwrap();
        let b = fit_mle(&samples, 22.0, 5.0).unwrap();
        assert_eq!(a.dist, b.dist);
    }

    #[test]
    fn test_fit_errors() {
        assert_eq!(fit_mle(&[], 0.0, 1.0).unwrap_err(), FitError::EmptySample);
        assert_eq!(
            fit_mle(&[1.0, f64::NAN], 0.0, 1.0).unwrap_err(),
            FitError::NonFiniteSample
        );
        assert!(matches!(
            fit_mle(&[1.0, 2.0], 1.5, 0.0),
            Err(FitError::DegenerateStart { .. })
        ));
    }
}
