//! Series ingestion: raw records → dense fixed-interval value series.
//!
//! Two entry points feed the engine:
//! - [`read_records`] + [`aggregate`] for raw timestamped event/mention
//!   records (JSON array or JSON lines)
//! - [`ValueSeries::from_json_str`] for series that were aggregated
//!   upstream

mod aggregate;
mod records;
mod series;
mod timestamp;

pub use aggregate::{aggregate, aggregate_by_entity, AggregatedSeries};
pub use aw_config::{Interval, IntervalUnit};
pub use records::{read_records, RawRecord, RecordBatch};
pub use series::{SeriesPoint, ValueSeries};
pub use timestamp::parse_timestamp;

use thiserror::Error;

/// Errors raised while reading or aggregating input.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A record's timestamp could not be parsed. Aggregation drops such
    /// records and counts them instead of returning this.
    #[error("record {record}: cannot parse timestamp {value}")]
    InvalidTimestamp { record: usize, value: String },

    /// The input violates the record schema (missing field, mixed weight
    /// field, non-object record). Raised before any aggregation.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("record {record}: invalid weight {value}")]
    InvalidWeight { record: usize, value: String },

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("series timestamps must be strictly increasing (point {index})")]
    Unordered { index: usize },

    #[error("series value at point {index} is not finite")]
    NonFiniteValue { index: usize },

    #[error("series point {index} is not on the {interval} bucket grid")]
    OffGrid { index: usize, interval: Interval },
}

impl From<IngestError> for aw_common::Error {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Schema(_) | IngestError::InvalidWeight { .. } => {
                aw_common::Error::Schema(err.to_string())
            }
            other => aw_common::Error::Input(other.to_string()),
        }
    }
}
