use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tracing::debug;

use super::aggregate::{bucket_start, MAX_BUCKETS};
use super::IngestError;
use crate::logging::event_names;
use aw_config::Interval;

/// One bucket of a value series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Ordered, gap-free series of `(timestamp, value)` pairs.
///
/// Timestamps are unique and strictly increasing; empty buckets carry 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueSeries {
    pub points: Vec<SeriesPoint>,
    /// True when values are summed weights (mentions), false for plain
    /// event counts.
    #[serde(default)]
    pub using_weights: bool,
    /// Bucket width, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeriesDocument {
    Full(ValueSeries),
    Points(Vec<SeriesPoint>),
}

impl ValueSeries {
    /// Build a series, checking ordering and finiteness.
    pub fn new(points: Vec<SeriesPoint>, using_weights: bool) -> Result<Self, IngestError> {
        let series = Self {
            points,
            using_weights,
            interval: None,
        };
        series.check()?;
        Ok(series)
    }

    /// Build a series from bare values with synthetic daily timestamps
    /// starting at the Unix epoch.
    pub fn from_values(values: &[f64]) -> Self {
        let origin = DateTime::<Utc>::default();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &value)| SeriesPoint {
                timestamp: origin + chrono::Duration::days(i as i64),
                value,
            })
            .collect();
        Self {
            points,
            using_weights: false,
            interval: Some(Interval::DAILY),
        }
    }

    /// Parse a pre-aggregated series. Accepts either the full object form
    /// (`{"points": [...], "using_weights": true}`) or a bare array of points.
    /// With a known `interval`, missing buckets are filled with 0.
    pub fn from_json_str(text: &str) -> Result<Self, IngestError> {
        let doc: SeriesDocument = serde_json::from_str(text)
            .map_err(|e| IngestError::Malformed(format!("invalid series JSON: {}", e)))?;
        let series = match doc {
            SeriesDocument::Full(series) => series,
            SeriesDocument::Points(points) => Self {
                points,
                ..Self::default()
            },
        };
        series.check()?;
        series.fill_gaps()
    }

    /// Set the bucket width and zero-fill any buckets missing from it.
    pub fn with_interval(mut self, interval: Interval) -> Result<Self, IngestError> {
        self.interval = Some(interval);
        self.fill_gaps()
    }

    /// Insert zero points for empty buckets on the grid anchored at the
    /// first point. Expects ordered points.
    fn fill_gaps(mut self) -> Result<Self, IngestError> {
        let Some(interval) = self.interval else {
            return Ok(self);
        };
        let Some(first) = self.points.first().map(|p| p.timestamp) else {
            return Ok(self);
        };

        let mut dense = Vec::with_capacity(self.points.len());
        let mut k = 0usize;
        for (index, point) in self.points.iter().enumerate() {
            loop {
                let expected = bucket_start(first, k, interval)
                    .ok_or(IngestError::OffGrid { index, interval })?;
                k += 1;
                if expected == point.timestamp {
                    dense.push(*point);
                    break;
                }
                if expected > point.timestamp {
                    return Err(IngestError::OffGrid { index, interval });
                }
                if dense.len() >= MAX_BUCKETS {
                    return Err(IngestError::Malformed(format!(
                        "series spans more than {} {} buckets",
                        MAX_BUCKETS, interval
                    )));
                }
                dense.push(SeriesPoint {
                    timestamp: expected,
                    value: 0.0,
                });
            }
        }

        let filled = dense.len() - self.points.len();
        if filled > 0 {
            debug!(
                target: event_names::INGEST_GAPS_FILLED,
                filled,
                interval = %interval,
                "zero-filled missing buckets"
            );
        }
        self.points = dense;
        Ok(self)
    }

    fn check(&self) -> Result<(), IngestError> {
        for (index, point) in self.points.iter().enumerate() {
            if !point.value.is_finite() {
                return Err(IngestError::NonFiniteValue { index });
            }
        }
        if let Some(pos) = self
            .points
            .windows(2)
            .position(|pair| pair[0].timestamp >= pair[1].timestamp)
        {
            return Err(IngestError::Unordered { index: pos + 1 });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.points.iter().map(|p| p.timestamp)
    }
}
