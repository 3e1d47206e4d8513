//! Activity Watch engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the engine configuration (JSON or TOML)
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Config snapshots for reproducible runs

pub mod engine;
pub mod interval;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use engine::{EngineConfig, IngestConfig, WindowConfig};
pub use interval::{Interval, IntervalUnit};
pub use resolve::{load_config, resolve_config, ConfigPath, ConfigSource, LoadedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
