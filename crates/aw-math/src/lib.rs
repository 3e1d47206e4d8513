//! Activity Watch math utilities.

pub mod math;

pub use math::gev::{fit_mle, Gev, GevFit, FitError};
pub use math::moments::*;
pub use math::optimize::{nelder_mead, NelderMeadOptions, Minimum};
pub use math::quantile::*;
