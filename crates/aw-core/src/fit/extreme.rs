use tracing::trace;

use super::{FitMethod, ThresholdFitError, ThresholdFitter, ThresholdSet};
use crate::logging::event_names;

/// GEV maximum-likelihood fitter.
///
/// Zero-valued samples are excluded before fitting. The fit is seeded with
/// the nonzero sample mean and standard deviation; each ceiling is the
/// upper edge of the fitted distribution's central interval of mass `q`,
/// rounded half-to-even.
#[derive(Debug, Clone)]
pub struct ExtremeValueFitter {
    min_samples: usize,
}

impl ExtremeValueFitter {
    pub fn new(min_samples: usize) -> Self {
        Self { min_samples }
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }
}

impl ThresholdFitter for ExtremeValueFitter {
    fn method(&self) -> FitMethod {
        FitMethod::ExtremeValue
    }

    fn fit(&self, values: &[f64], levels: &[f64]) -> Result<ThresholdSet, ThresholdFitError> {
        let nonzero: Vec<f64> = values.iter().copied().filter(|&v| v > 0.0).collect();
        if nonzero.is_empty() || nonzero.len() < self.min_samples {
            return Err(ThresholdFitError::InsufficientSamples {
                found: nonzero.len(),
                required: self.min_samples,
            });
        }

        let loc0 = aw_math::mean(&nonzero);
        let scale0 = aw_math::sample_std(&nonzero);
        let fit = aw_math::fit_mle(&nonzero, loc0, scale0)?;
        trace!(
            target: event_names::FIT_EXTREME_VALUE,
            shape = fit.dist.shape,
            loc = fit.dist.loc,
            scale = fit.dist.scale,
            iterations = fit.iterations,
            converged = fit.converged,
            "gev fit"
        );

        levels
            .iter()
            .map(|&q| {
                let (_, upper) = fit.dist.interval(q);
                let ceiling = upper.round_ties_even();
                if ceiling.is_finite() {
                    Ok(ceiling)
                } else {
                    Err(ThresholdFitError::NonFiniteThreshold { level: q })
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ThresholdSet::new)
    }
}
