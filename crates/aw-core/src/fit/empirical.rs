use super::{FitMethod, ThresholdFitError, ThresholdFitter, ThresholdSet};

/// Empirical quantiles (linear interpolation) over the whole slice,
/// zero-valued buckets included.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantileFitter;

impl QuantileFitter {
    /// Infallible form of [`ThresholdFitter::fit`]. An empty slice yields NaN
    /// ceilings.
    pub fn quantiles(&self, values: &[f64], levels: &[f64]) -> ThresholdSet {
        ThresholdSet::new(aw_math::quantiles(values, levels))
    }
}

impl ThresholdFitter for QuantileFitter {
    fn method(&self) -> FitMethod {
        FitMethod::Empirical
    }

    fn fit(&self, values: &[f64], levels: &[f64]) -> Result<ThresholdSet, ThresholdFitError> {
        Ok(self.quantiles(values, levels))
    }
}
