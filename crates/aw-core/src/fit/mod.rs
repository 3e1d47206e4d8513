//! Threshold fitting: a slice of history → one ceiling per quantile level.
//!
//! Two fitters implement [`ThresholdFitter`]:
//! - [`ExtremeValueFitter`]: GEV maximum-likelihood fit on the nonzero
//!   samples, ceiling = upper edge of the central interval of mass `q`
//! - [`QuantileFitter`]: empirical quantiles of the full slice
//!
//! [`AdaptiveFitter`] picks between them by nonzero sample count and falls
//! back to the empirical path whenever the extreme-value fit fails.

mod empirical;
mod extreme;

pub use empirical::QuantileFitter;
pub use extreme::ExtremeValueFitter;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::logging::event_names;

/// Ordered ceilings, one per configured quantile level.
///
/// Empirical sets are non-decreasing by construction; extreme-value sets
/// are not separately checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdSet(Vec<f64>);

impl ThresholdSet {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The topmost regular ceiling.
    pub fn top(&self) -> Option<f64> {
        self.0.last().copied()
    }

    pub fn is_non_decreasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }
}

impl From<Vec<f64>> for ThresholdSet {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Which estimator produced a threshold set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    ExtremeValue,
    Empirical,
}

impl std::fmt::Display for FitMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitMethod::ExtremeValue => write!(f, "extreme_value"),
            FitMethod::Empirical => write!(f, "empirical"),
        }
    }
}

/// Why a fitter declined or failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThresholdFitError {
    #[error("need {required} nonzero samples, found {found}")]
    InsufficientSamples { found: usize, required: usize },

    #[error(transparent)]
    Gev(#[from] aw_math::FitError),

    #[error("fitted ceiling for level {level} is not finite")]
    NonFiniteThreshold { level: f64 },
}

/// Capability: estimate ceilings for `levels` from a slice of history.
pub trait ThresholdFitter {
    fn method(&self) -> FitMethod;

    fn fit(&self, values: &[f64], levels: &[f64]) -> Result<ThresholdSet, ThresholdFitError>;
}

/// A threshold set tagged with the estimator that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedThresholds {
    pub thresholds: ThresholdSet,
    pub method: FitMethod,
}

/// Extreme-value fit when enough nonzero data exists, empirical otherwise.
#[derive(Debug, Clone)]
pub struct AdaptiveFitter {
    primary: ExtremeValueFitter,
    fallback: QuantileFitter,
}

impl AdaptiveFitter {
    pub fn new(min_fit_samples: usize) -> Self {
        Self {
            primary: ExtremeValueFitter::new(min_fit_samples),
            fallback: QuantileFitter,
        }
    }

    /// Fit thresholds, never failing: any primary error routes to the
    /// empirical estimator over the full slice.
    pub fn fit(&self, values: &[f64], levels: &[f64]) -> FittedThresholds {
        match self.primary.fit(values, levels) {
            Ok(thresholds) => FittedThresholds {
                thresholds,
                method: self.primary.method(),
            },
            Err(err) => {
                debug!(
                    target: event_names::FIT_FALLBACK,
                    samples = values.len(),
                    reason = %err,
                    "using empirical quantiles"
                );
                FittedThresholds {
                    thresholds: self.fallback.quantiles(values, levels),
                    method: self.fallback.method(),
                }
            }
        }
    }
}
