//! Re-fit scheduling: which slice of history each threshold set is fitted
//! on, and which indices it stays pinned to.
//!
//! The schedule is a pure function of the series length and a
//! [`WindowSpec`]. [`WindowScheduler`] yields one [`FitSpan`] per fit:
//!
//! ```text
//! fit 0: history [0, start)                 pinned to [0, start)
//! fit k: history [ws, start + k*step)       pinned to the `step` indices ending there
//! last:  history [ws, len)                  pinned to the remaining tail
//! ```
//!
//! where `ws` slides forward so that no fitted slice after the first spans
//! more than `rolling_window` samples. [`PinnedThresholds`] runs a fitter
//! over every span and materialises the index → threshold set lookup.

use serde::Serialize;
use tracing::debug;

use crate::fit::{AdaptiveFitter, FitMethod, ThresholdSet};
use crate::logging::event_names;
use aw_config::EngineConfig;

/// Warm-up offset, re-fit cadence and history cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSpec {
    pub start_idx: usize,
    pub expanding_window: usize,
    pub rolling_window: usize,
}

impl WindowSpec {
    pub fn new(start_idx: usize, expanding_window: usize, rolling_window: usize) -> Self {
        Self {
            start_idx,
            expanding_window,
            rolling_window,
        }
    }

    /// Iterate the fit spans for a series of `len` samples.
    pub fn spans(&self, len: usize) -> WindowScheduler {
        WindowScheduler::new(*self, len)
    }
}

impl From<&EngineConfig> for WindowSpec {
    fn from(config: &EngineConfig) -> Self {
        Self::new(
            config.start_idx,
            config.expanding_window,
            config.rolling_window,
        )
    }
}

/// One scheduled fit: the history slice it sees and the indices it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FitSpan {
    /// History slice `[fit_start, fit_end)` handed to the fitter.
    pub fit_start: usize,
    pub fit_end: usize,
    /// Indices `[apply_start, apply_start + apply_len)` pinned to the result.
    pub apply_start: usize,
    pub apply_len: usize,
}

impl FitSpan {
    pub fn fit_len(&self) -> usize {
        self.fit_end - self.fit_start
    }

    pub fn apply_end(&self) -> usize {
        self.apply_start.saturating_add(self.apply_len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    First,
    Middle,
    Last { tail: usize },
    Done,
}

/// Lazy, finite, restartable sequence of [`FitSpan`]s.
///
/// Spans are contiguous and together cover `[0, len)` exactly once. A
/// `start_idx` beyond the series length yields no spans.
#[derive(Debug, Clone)]
pub struct WindowScheduler {
    spec: WindowSpec,
    len: usize,
    window_start: usize,
    window_end: usize,
    cursor: usize,
    phase: Phase,
}

impl WindowScheduler {
    pub fn new(spec: WindowSpec, len: usize) -> Self {
        let phase = if spec.start_idx > len || spec.expanding_window == 0 {
            Phase::Done
        } else {
            Phase::First
        };
        Self {
            spec,
            len,
            window_start: 0,
            window_end: spec.start_idx,
            cursor: 0,
            phase,
        }
    }

    fn advance(&mut self) {
        // An overflowing step can never fit before `len`: treat it as the end.
        match self.window_end.checked_add(self.spec.expanding_window) {
            Some(next) if next < self.len => {
                self.window_end = next;
                self.phase = Phase::Middle;
            }
            _ => {
                self.phase = Phase::Last {
                    tail: self.len - self.window_end,
                };
                self.window_end = self.len;
            }
        }
        if self.window_end - self.window_start > self.spec.rolling_window {
            self.window_start = self.window_end - self.spec.rolling_window;
        }
    }
}

impl Iterator for WindowScheduler {
    type Item = FitSpan;

    fn next(&mut self) -> Option<FitSpan> {
        let apply_len = match self.phase {
            Phase::Done => return None,
            Phase::First => self.window_end - self.window_start,
            Phase::Middle => self.spec.expanding_window,
            Phase::Last { tail } => tail,
        };

        let span = FitSpan {
            fit_start: self.window_start,
            fit_end: self.window_end,
            apply_start: self.cursor,
            apply_len,
        };
        self.cursor = self.cursor.saturating_add(apply_len);

        if matches!(self.phase, Phase::Last { .. }) {
            self.phase = Phase::Done;
        } else {
            self.advance();
        }
        Some(span)
    }
}

/// A fitted span: the schedule entry plus its thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinnedSpan {
    #[serde(flatten)]
    pub span: FitSpan,
    pub method: FitMethod,
    pub thresholds: ThresholdSet,
}

/// Index → threshold set lookup for a whole series.
#[derive(Debug, Clone, Default)]
pub struct PinnedThresholds {
    spans: Vec<PinnedSpan>,
    lookup: Vec<Option<usize>>,
}

impl PinnedThresholds {
    /// Fit every scheduled span over `values` and build the lookup table.
    ///
    /// Zero-length spans are skipped.
    pub fn build(values: &[f64], spec: WindowSpec, levels: &[f64], fitter: &AdaptiveFitter) -> Self {
        let mut spans = Vec::new();
        let mut lookup = vec![None; values.len()];

        for span in spec.spans(values.len()).filter(|s| s.apply_len > 0) {
            let fitted = fitter.fit(&values[span.fit_start..span.fit_end], levels);
            debug!(
                target: event_names::SCHEDULE_SPAN,
                fit_start = span.fit_start,
                fit_end = span.fit_end,
                apply_start = span.apply_start,
                apply_len = span.apply_len,
                method = %fitted.method,
                "pinned thresholds"
            );
            let slot = spans.len();
            for entry in &mut lookup[span.apply_start..span.apply_end()] {
                *entry = Some(slot);
            }
            spans.push(PinnedSpan {
                span,
                method: fitted.method,
                thresholds: fitted.thresholds,
            });
        }

        Self { spans, lookup }
    }

    /// Threshold set pinned at `index`, if any.
    pub fn at(&self, index: usize) -> Option<&ThresholdSet> {
        let slot = (*self.lookup.get(index)?)?;
        self.spans.get(slot).map(|s| &s.thresholds)
    }

    pub fn spans(&self) -> &[PinnedSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
