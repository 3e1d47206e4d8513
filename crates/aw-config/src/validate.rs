//! Configuration validation errors and semantic validation.

use std::collections::HashSet;
use thiserror::Error;

use crate::engine::EngineConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate an engine configuration semantically.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_quantile_levels(&config.quantile_levels)?;

    let expected_states = config.quantile_levels.len() + 2;
    if config.state_names.len() != expected_states {
        return Err(ValidationError::SemanticError(format!(
            "state_names must hold quantile_levels.len() + 2 = {} names, got {}",
            expected_states,
            config.state_names.len()
        )));
    }
    if let Some(i) = config.state_names.iter().position(|n| n.trim().is_empty()) {
        return Err(invalid(format!("state_names[{}]", i), "Must not be empty"));
    }

    if config.expanding_window == 0 {
        return Err(invalid("expanding_window", "Must be at least 1"));
    }
    if config.rolling_window == 0 {
        return Err(invalid("rolling_window", "Must be at least 1"));
    }

    if config.windows.is_empty() {
        return Err(ValidationError::SemanticError(
            "At least one classification window is required".to_string(),
        ));
    }
    let mut labels = HashSet::new();
    for (i, w) in config.windows.iter().enumerate() {
        if w.length == 0 {
            return Err(invalid(format!("windows[{}].length", i), "Must be at least 1"));
        }
        if w.label.trim().is_empty() {
            return Err(invalid(format!("windows[{}].label", i), "Must not be empty"));
        }
        if !labels.insert(w.label.as_str()) {
            return Err(invalid(
                format!("windows[{}].label", i),
                format!("Duplicate label '{}'", w.label),
            ));
        }
    }

    if !(config.extreme_multiplier.is_finite() && config.extreme_multiplier > 0.0) {
        return Err(invalid(
            "extreme_multiplier",
            format!("Must be finite and > 0, got {}", config.extreme_multiplier),
        ));
    }

    if config.alert_min_state >= config.state_names.len() {
        return Err(invalid(
            "alert_min_state",
            format!(
                "Must be below the number of states ({}), got {}",
                config.state_names.len(),
                config.alert_min_state
            ),
        ));
    }

    if config.ingest.timestamp_field.trim().is_empty() {
        return Err(invalid("ingest.timestamp_field", "Must not be empty"));
    }
    if config.ingest.weight_field.trim().is_empty() {
        return Err(invalid("ingest.weight_field", "Must not be empty"));
    }

    Ok(())
}

fn validate_quantile_levels(levels: &[f64]) -> ValidationResult<()> {
    if levels.is_empty() {
        return Err(invalid("quantile_levels", "At least one level is required"));
    }
    for (i, &q) in levels.iter().enumerate() {
        if !(q > 0.0 && q < 1.0) {
            return Err(invalid(
                format!("quantile_levels[{}]", i),
                format!("Must be in (0, 1), got {}", q),
            ));
        }
    }
    if levels.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(invalid(
            "quantile_levels",
            format!("Must be strictly ascending, got {:?}", levels),
        ));
    }
    Ok(())
}
