//! Report documents and their renderings.
//!
//! Every command result is wrapped in an envelope carrying the schema
//! version, run id, generation time and a [`ConfigSnapshot`], then rendered
//! in one of the [`OutputFormat`]s:
//! - `json`: the pretty-printed envelope
//! - `jsonl`: one object per state row (or threshold span)
//! - `md`: Markdown tables
//! - `summary`: one line per window label

mod markdown;
mod summary;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::{EngineOutput, StateRow};
use crate::schedule::PinnedSpan;
use crate::segments::{segments, Segment};
use aw_common::{OutputFormat, SCHEMA_VERSION};
use aw_config::ConfigSnapshot;

/// Engine output for one entity's series.
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    /// `None` when the input was not split by entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Records dropped for unparseable timestamps.
    pub dropped_records: usize,
    #[serde(flatten)]
    pub output: EngineOutput,
    /// Same-state runs per window label.
    pub segments: BTreeMap<String, Vec<Segment>>,
}

impl EntityReport {
    pub fn new(entity: Option<String>, dropped_records: usize, output: EngineOutput) -> Self {
        let segments = output
            .labels
            .iter()
            .map(|l| (l.summary.label.clone(), segments(&l.rows)))
            .collect();
        Self {
            entity,
            dropped_records,
            output,
            segments,
        }
    }

    fn display_name(&self) -> &str {
        self.entity.as_deref().unwrap_or("series")
    }
}

/// Result of `analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub config: ConfigSnapshot,
    pub entities: Vec<EntityReport>,
}

impl AnalysisReport {
    pub fn new(run_id: impl Into<String>, config: ConfigSnapshot, entities: Vec<EntityReport>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.into(),
            generated_at: Utc::now(),
            config,
            entities,
        }
    }

    /// True when any entity has a window alerting on its latest step.
    pub fn alert_active(&self) -> bool {
        self.entities.iter().any(|e| e.output.alert_active())
    }
}

/// Result of `thresholds`.
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub config: ConfigSnapshot,
    pub series_len: usize,
    pub spans: Vec<PinnedSpan>,
}

impl ThresholdReport {
    pub fn new(
        run_id: impl Into<String>,
        config: ConfigSnapshot,
        series_len: usize,
        spans: Vec<PinnedSpan>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.into(),
            generated_at: Utc::now(),
            config,
            series_len,
            spans,
        }
    }
}

#[derive(Serialize)]
struct RowLine<'a> {
    run_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity: Option<&'a str>,
    #[serde(flatten)]
    row: &'a StateRow,
}

#[derive(Serialize)]
struct SpanLine<'a> {
    run_id: &'a str,
    #[serde(flatten)]
    span: &'a PinnedSpan,
}

/// Render an analysis report.
pub fn render_analysis(report: &AnalysisReport, format: OutputFormat) -> aw_common::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Jsonl => {
            let mut out = String::new();
            for entity in &report.entities {
                for row in entity.output.rows() {
                    let line = RowLine {
                        run_id: &report.run_id,
                        entity: entity.entity.as_deref(),
                        row,
                    };
                    out.push_str(&serde_json::to_string(&line)?);
                    out.push('\n');
                }
            }
            Ok(out)
        }
        OutputFormat::Md => Ok(markdown::analysis(report)),
        OutputFormat::Summary => Ok(summary::analysis(report)),
    }
}

/// Render a threshold report.
pub fn render_thresholds(report: &ThresholdReport, format: OutputFormat) -> aw_common::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Jsonl => {
            let mut out = String::new();
            for span in &report.spans {
                let line = SpanLine {
                    run_id: &report.run_id,
                    span,
                };
                out.push_str(&serde_json::to_string(&line)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Md => Ok(markdown::thresholds(report)),
        OutputFormat::Summary => Ok(summary::thresholds(report)),
    }
}

fn format_thresholds(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ActivityEngine;
    use crate::ingest::ValueSeries;
    use aw_config::{EngineConfig, WindowConfig};

    fn report(spike: bool) -> AnalysisReport {
        let config = EngineConfig {
            start_idx: 30,
            expanding_window: 10,
            rolling_window: 100,
            windows: vec![WindowConfig::new(5, "short")],
            min_fit_samples: 1000,
            ..EngineConfig::default()
        };
        let engine = ActivityEngine::new(config.clone()).unwrap();
        let mut values: Vec<f64> = (0..60).map(|i| 1.0 + (i % 5) as f64).collect();
        if spike {
            values.push(10_000.0);
        }
        let output = engine.run(&ValueSeries::from_values(&values));
        AnalysisReport::new(
            "run-test",
            ConfigSnapshot::from_config(&config),
            vec![EntityReport::new(None, 0, output)],
        )
    }

    #[test]
    fn test_json_envelope() {
        let text = render_analysis(&report(false), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["run_id"], "run-test");
        assert_eq!(value["entities"][0]["series_len"], 60);
        assert!(value["entities"][0]["segments"]["short"].is_array());
        assert!(value["config"]["config_hash"].is_string());
    }

    #[test]
    fn test_jsonl_one_line_per_row() {
        let text = render_analysis(&report(false), OutputFormat::Jsonl).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 60);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["label"], "short");
        assert_eq!(first["state"]["kind"], "no_state");
        assert!(first.get("entity").is_none());
    }

    #[test]
    fn test_markdown_and_summary_mention_alert() {
        let r = report(true);
        assert!(r.alert_active());
        let md = render_analysis(&r, OutputFormat::Md).unwrap();
        assert!(md.starts_with("# Activity analysis"));
        assert!(md.contains("| short |"));
        let line = render_analysis(&r, OutputFormat::Summary).unwrap();
        assert!(line.contains("ALERT"));
    }

    #[test]
    fn test_threshold_jsonl() {
        let config = EngineConfig {
            start_idx: 30,
            expanding_window: 10,
            min_fit_samples: 1000,
            ..EngineConfig::default()
        };
        let engine = ActivityEngine::new(config.clone()).unwrap();
        let values: Vec<f64> = (0..50).map(f64::from).collect();
        let pinned = engine.pin_thresholds(&values);
        let report = ThresholdReport::new(
            "run-test",
            ConfigSnapshot::from_config(&config),
            values.len(),
            pinned.spans().to_vec(),
        );
        let text = render_thresholds(&report, OutputFormat::Jsonl).unwrap();
        assert_eq!(text.lines().count(), 3);
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["fit_end"], 30);
        assert_eq!(first["method"], "empirical");
        assert_eq!(first["thresholds"].as_array().unwrap().len(), 4);
    }
}
