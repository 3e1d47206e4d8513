//! Core math modules.

pub mod gev;
pub mod moments;
pub mod optimize;
pub mod quantile;
