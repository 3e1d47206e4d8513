//! Activity Watch core library
//!
//! Turns event-count time series into ordered activity states and
//! edge-triggered escalation alerts:
//! - Ingestion and fixed-interval aggregation of raw records
//! - Adaptive threshold fitting (GEV with empirical fallback)
//! - Expanding/rolling re-fit scheduling
//! - Window classification, alerting and segment building
//! - Report rendering, logging and exit codes for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod alert;
pub mod classify;
pub mod engine;
pub mod exit_codes;
pub mod fit;
pub mod ingest;
pub mod logging;
pub mod output;
pub mod schedule;
pub mod segments;

pub use engine::{ActivityEngine, EngineError, EngineOutput, StateRow};
