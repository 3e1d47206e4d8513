//! Engine configuration types.
//!
//! Every field has a default, so an empty document (`{}` or an empty TOML
//! file) yields the standard daily configuration: four quantile levels,
//! six activity states, a 360-step warm-up, refits every 60 steps over at
//! most 1460 steps of history, and a short (14) and long (60) view.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::interval::Interval;
use crate::validate::{ValidationError, ValidationResult};

/// One classification view: a trailing window length and its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Number of trailing samples evaluated per step.
    pub length: usize,
    /// Label used in output rows (e.g. "7 day").
    pub label: String,
}

impl WindowConfig {
    pub fn new(length: usize, label: impl Into<String>) -> Self {
        Self {
            length,
            label: label.into(),
        }
    }
}

/// Field names used when reading raw records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Field holding the record timestamp.
    pub timestamp_field: String,
    /// Field holding the per-record weight (mention count).
    pub weight_field: String,
    /// Optional field used to split records into per-entity series.
    pub entity_field: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timestamp_field: "datetime_of_article".to_string(),
            weight_field: "nummentions".to_string(),
            entity_field: None,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub schema_version: String,
    /// Ascending quantile levels in (0, 1); one ceiling is fitted per level.
    pub quantile_levels: Vec<f64>,
    /// Ordered state labels, lowest first. Must hold `quantile_levels.len() + 2` names.
    pub state_names: Vec<String>,
    /// Warm-up offset: no state is computed before this index.
    pub start_idx: usize,
    /// Refit cadence in steps.
    pub expanding_window: usize,
    /// Maximum history span fed to a single fit.
    pub rolling_window: usize,
    /// Classification views.
    pub windows: Vec<WindowConfig>,
    /// Nonzero samples required before the extreme-value fit is attempted.
    pub min_fit_samples: usize,
    /// Multiple of the topmost ceiling that triggers the extreme state.
    pub extreme_multiplier: f64,
    /// Lowest state index that raises an alert when entered from below.
    pub alert_min_state: usize,
    /// Aggregation interval for raw records.
    pub interval: Interval,
    pub ingest: IngestConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            quantile_levels: vec![0.70, 0.85, 0.92, 0.98],
            state_names: [
                "Very Low",
                "Low",
                "Moderate",
                "High",
                "Very High",
                "Extreme High",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            start_idx: 360,
            expanding_window: 60,
            rolling_window: 1460,
            windows: vec![WindowConfig::new(14, "7 day"), WindowConfig::new(60, "30 day")],
            min_fit_samples: 30,
            extreme_multiplier: 3.0,
            alert_min_state: 3,
            interval: Interval::DAILY,
            ingest: IngestConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file. `.toml` files are parsed as TOML,
    /// everything else as JSON.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(text: &str) -> ValidationResult<Self> {
        toml::from_str(text).map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Canonical JSON used for hashing and display.
    pub fn to_canonical_json(&self) -> String {
        // Struct field order is fixed, so serde_json output is stable.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Index of the extreme state (the last name).
    pub fn extreme_state(&self) -> usize {
        self.state_names.len().saturating_sub(1)
    }

    /// Look up a window by label.
    pub fn window(&self, label: &str) -> Option<&WindowConfig> {
        self.windows.iter().find(|w| w.label == label)
    }
}
