//! The full engine pass: series → pinned thresholds → states → alerts.
//!
//! Threshold sets are fitted once per series and shared by every window
//! label; each label is then classified and alerted independently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::alert::alerts;
use crate::classify::{StateCell, StateClassifier};
use crate::fit::AdaptiveFitter;
use crate::ingest::{IngestError, ValueSeries};
use crate::logging::event_names;
use crate::schedule::{PinnedSpan, PinnedThresholds, WindowSpec};
use aw_config::{validate_config, EngineConfig, ValidationError, WindowConfig};

/// Errors from constructing or feeding the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl From<EngineError> for aw_common::Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Config(e) => config_error(e),
            EngineError::Ingest(e) => e.into(),
        }
    }
}

/// Map a configuration failure onto the shared error type. An unreadable
/// config file is a configuration error, not an I/O one.
pub fn config_error(err: ValidationError) -> aw_common::Error {
    match err {
        ValidationError::InvalidValue { field, message } => {
            aw_common::Error::InvalidConfigValue { field, message }
        }
        other => aw_common::Error::Config(other.to_string()),
    }
}

/// One (index, window label) result handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateRow {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub label: String,
    pub state: StateCell,
    pub alert: bool,
}

/// Per-label roll-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSummary {
    pub label: String,
    pub window: usize,
    /// Rows carrying a computed state.
    pub populated: usize,
    pub alerts: usize,
    /// State and alert on the final index of the series.
    pub latest_state: StateCell,
    pub latest_alert: bool,
    pub latest_timestamp: Option<DateTime<Utc>>,
}

/// Rows and summary for one window label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelResult {
    pub summary: LabelSummary,
    pub rows: Vec<StateRow>,
}

/// Everything one engine pass produces for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineOutput {
    pub series_len: usize,
    pub using_weights: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    pub spans: Vec<PinnedSpan>,
    pub labels: Vec<LabelResult>,
}

impl EngineOutput {
    /// All rows, label-major.
    pub fn rows(&self) -> impl Iterator<Item = &StateRow> + '_ {
        self.labels.iter().flat_map(|l| l.rows.iter())
    }

    pub fn label(&self, label: &str) -> Option<&LabelResult> {
        self.labels.iter().find(|l| l.summary.label == label)
    }

    /// True when any label alerts on the final index.
    pub fn alert_active(&self) -> bool {
        self.labels.iter().any(|l| l.summary.latest_alert)
    }

    pub fn total_alerts(&self) -> usize {
        self.labels.iter().map(|l| l.summary.alerts).sum()
    }
}

/// Configured engine. Construction validates the configuration, so a pass
/// over any well-formed series cannot fail.
#[derive(Debug, Clone)]
pub struct ActivityEngine {
    config: EngineConfig,
    fitter: AdaptiveFitter,
}

impl ActivityEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        validate_config(&config)?;
        let fitter = AdaptiveFitter::new(config.min_fit_samples);
        Ok(Self { config, fitter })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec::from(&self.config)
    }

    /// Fit and pin thresholds for every index of `values`.
    pub fn pin_thresholds(&self, values: &[f64]) -> PinnedThresholds {
        PinnedThresholds::build(
            values,
            self.window_spec(),
            &self.config.quantile_levels,
            &self.fitter,
        )
    }

    pub fn run(&self, series: &ValueSeries) -> EngineOutput {
        let values = series.values();
        info!(
            target: event_names::ENGINE_STARTED,
            len = values.len(),
            windows = self.config.windows.len(),
            using_weights = series.using_weights,
            "engine pass started"
        );

        let pinned = self.pin_thresholds(&values);
        let labels: Vec<LabelResult> = self
            .config
            .windows
            .iter()
            .map(|w| self.run_label(series, &values, &pinned, w))
            .collect();

        let output = EngineOutput {
            series_len: values.len(),
            using_weights: series.using_weights,
            interval: series.interval.map(|i| i.to_string()),
            spans: pinned.spans().to_vec(),
            labels,
        };

        info!(
            target: event_names::ENGINE_FINISHED,
            spans = output.spans.len(),
            alerts = output.total_alerts(),
            alert_active = output.alert_active(),
            "engine pass finished"
        );
        output
    }

    fn run_label(
        &self,
        series: &ValueSeries,
        values: &[f64],
        pinned: &PinnedThresholds,
        window: &WindowConfig,
    ) -> LabelResult {
        let classifier =
            StateClassifier::new(&self.config.state_names, self.config.extreme_multiplier);
        let cells = classifier.classify_series(values, pinned, window.length, self.config.start_idx);
        let flags = alerts(&cells, self.config.alert_min_state);

        let rows: Vec<StateRow> = series
            .points
            .iter()
            .zip(cells)
            .zip(flags)
            .enumerate()
            .map(|(index, ((point, state), alert))| StateRow {
                index,
                timestamp: point.timestamp,
                value: point.value,
                label: window.label.clone(),
                state,
                alert,
            })
            .collect();

        for row in rows.iter().filter(|r| r.alert) {
            debug!(
                target: event_names::ENGINE_ALERT,
                label = %window.label,
                index = row.index,
                timestamp = %row.timestamp,
                state = %row.state,
                "escalation"
            );
        }

        let latest = rows.last();
        let summary = LabelSummary {
            label: window.label.clone(),
            window: window.length,
            populated: rows.iter().filter(|r| r.state.is_set()).count(),
            alerts: rows.iter().filter(|r| r.alert).count(),
            latest_state: latest.map(|r| r.state.clone()).unwrap_or_default(),
            latest_alert: latest.map(|r| r.alert).unwrap_or(false),
            latest_timestamp: latest.map(|r| r.timestamp),
        };
        LabelResult { summary, rows }
    }
}
