//! Activity Watch common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Common error type with stable codes
//! - Output format specifications

pub mod error;
pub mod output;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;

/// Schema version stamped on every engine output document.
pub const SCHEMA_VERSION: &str = "1.0.0";
