//! Contiguous same-state runs for timeline renderers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::StateCell;
use crate::engine::StateRow;

/// A maximal run of rows sharing one state (unset runs included).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub state: StateCell,
    pub start_index: usize,
    pub end_index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Timestamps within the run whose row raised an alert.
    pub alerts: Vec<DateTime<Utc>>,
}

impl Segment {
    pub fn row_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

/// Split one label's rows into state segments, in order.
pub fn segments(rows: &[StateRow]) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for row in rows {
        match out.last_mut() {
            Some(seg) if seg.state == row.state => {
                seg.end_index = row.index;
                seg.end = row.timestamp;
                if row.alert {
                    seg.alerts.push(row.timestamp);
                }
            }
            _ => out.push(Segment {
                state: row.state.clone(),
                start_index: row.index,
                end_index: row.index,
                start: row.timestamp,
                end: row.timestamp,
                alerts: if row.alert { vec![row.timestamp] } else { Vec::new() },
            }),
        }
    }
    out
}
