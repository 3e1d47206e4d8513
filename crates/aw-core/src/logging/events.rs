//! Structured event vocabulary.
//!
//! Event names are used as the tracing `target`, so they show up as the
//! `target` key in JSONL output and can be filtered with `RUST_LOG`
//! (e.g. `RUST_LOG=fit.fallback=debug`).

use serde::{Deserialize, Serialize};

/// Processing stages in the engine pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading and aggregating input records.
    Ingest,
    /// Threshold fitting.
    Fit,
    /// Re-fit scheduling.
    Schedule,
    /// State classification and alerting.
    Classify,
    /// Rendering results.
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Fit => "fit",
            Stage::Schedule => "schedule",
            Stage::Classify => "classify",
            Stage::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Ingest stage
    pub const INGEST_STARTED: &str = "ingest.started";
    pub const INGEST_DROPPED_RECORD: &str = "ingest.dropped_record";
    pub const INGEST_GAPS_FILLED: &str = "ingest.gaps_filled";
    pub const INGEST_FINISHED: &str = "ingest.finished";

    // Fit stage
    pub const FIT_EXTREME_VALUE: &str = "fit.extreme_value";
    pub const FIT_FALLBACK: &str = "fit.fallback";

    // Schedule stage
    pub const SCHEDULE_SPAN: &str = "schedule.span";

    // Engine
    pub const ENGINE_STARTED: &str = "engine.started";
    pub const ENGINE_ALERT: &str = "engine.alert";
    pub const ENGINE_FINISHED: &str = "engine.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation context for one CLI invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }

    /// Root span carrying the run id; every event emitted inside it is
    /// tagged with `run_id` in JSONL output.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("run", run_id = %self.run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Ingest,
            Stage::Fit,
            Stage::Schedule,
            Stage::Classify,
            Stage::Output,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::RUN_STARTED, "run.started");
        assert_eq!(event_names::FIT_FALLBACK, "fit.fallback");
        assert_eq!(event_names::INGEST_DROPPED_RECORD, "ingest.dropped_record");
    }

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new("run-abc");
        assert_eq!(ctx.run_id, "run-abc");
    }
}
