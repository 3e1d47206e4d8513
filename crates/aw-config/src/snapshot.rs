//! Configuration snapshots for reproducibility.
//!
//! A snapshot captures the exact configuration a run used, so two outputs
//! can be checked for comparability by hash alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::EngineConfig;
use crate::resolve::LoadedConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// SHA-256 of the canonical JSON form of the configuration.
    pub config_hash: String,

    /// Path the configuration was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub quantile_levels: Vec<f64>,
    pub start_idx: usize,
    pub expanding_window: usize,
    pub rolling_window: usize,
    pub window_labels: Vec<String>,
    pub interval: String,
}

impl ConfigSnapshot {
    /// Create a snapshot from a loaded configuration.
    pub fn new(loaded: &LoadedConfig) -> Self {
        let mut snapshot = Self::from_config(&loaded.config);
        snapshot.config_path = loaded.path.as_ref().map(|p| p.display().to_string());
        snapshot.config_source = loaded.source.to_string();
        snapshot
    }

    /// Create a snapshot of an in-memory configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_hash: hash_content(&config.to_canonical_json()),
            config_path: None,
            config_source: crate::resolve::ConfigSource::BuiltinDefault.to_string(),
            summary: ConfigSummary {
                quantile_levels: config.quantile_levels.clone(),
                start_idx: config.start_idx,
                expanding_window: config.expanding_window,
                rolling_window: config.rolling_window,
                window_labels: config.windows.iter().map(|w| w.label.clone()).collect(),
                interval: config.interval.to_string(),
            },
        }
    }

    /// Check if this snapshot matches another (same config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}

/// Compute SHA-256 hash of content.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
