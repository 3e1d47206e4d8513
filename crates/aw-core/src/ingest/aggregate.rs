use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use tracing::{debug, warn};

use super::records::{RawRecord, RecordBatch};
use super::series::{SeriesPoint, ValueSeries};
use super::timestamp::parse_timestamp;
use super::IngestError;
use crate::logging::event_names;
use aw_config::{Interval, IntervalUnit};

/// Upper bound on the number of buckets a single series may span.
pub const MAX_BUCKETS: usize = 5_000_000;

/// A dense series plus what was lost building it.
#[derive(Debug, Clone, Default)]
pub struct AggregatedSeries {
    pub series: ValueSeries,
    /// Records dropped because their timestamp could not be parsed.
    pub dropped: usize,
}

impl AggregatedSeries {
    pub fn using_weights(&self) -> bool {
        self.series.using_weights
    }
}

/// Sum record weights into consecutive `interval` buckets.
///
/// The bucket grid is anchored at midnight UTC of the earliest record's
/// day (hours, days), the Monday of its week (weeks) or the first of its
/// month (months); the series starts at the bucket holding the earliest
/// record. Buckets with no records are present with value 0.
///
/// Each point is stamped with its bucket's start. Period-end labelling
/// (weeks ending Sunday, months ending on their last day) groups the same
/// records but stamps them 6 days or one month minus a day later.
pub fn aggregate(batch: &RecordBatch, interval: Interval) -> Result<AggregatedSeries, IngestError> {
    aggregate_indexed(
        batch.records.iter().enumerate(),
        batch.using_weights,
        interval,
    )
}

/// Aggregate each entity separately, keyed by entity value.
///
/// Records without an entity value are grouped under the empty string.
pub fn aggregate_by_entity(
    batch: &RecordBatch,
    interval: Interval,
) -> Result<BTreeMap<String, AggregatedSeries>, IngestError> {
    let mut groups: BTreeMap<String, Vec<(usize, &RawRecord)>> = BTreeMap::new();
    for (i, record) in batch.records.iter().enumerate() {
        groups
            .entry(record.entity.clone().unwrap_or_default())
            .or_default()
            .push((i, record));
    }

    groups
        .into_iter()
        .map(|(entity, records)| {
            let series = aggregate_indexed(records.into_iter(), batch.using_weights, interval)?;
            Ok((entity, series))
        })
        .collect()
}

fn aggregate_indexed<'a>(
    records: impl Iterator<Item = (usize, &'a RawRecord)>,
    using_weights: bool,
    interval: Interval,
) -> Result<AggregatedSeries, IngestError> {
    let mut dropped = 0usize;
    let mut parsed: Vec<(DateTime<Utc>, f64)> = Vec::new();
    for (i, record) in records {
        match parse_timestamp(&record.timestamp) {
            Some(ts) => parsed.push((ts, record.weight)),
            None => {
                dropped += 1;
                debug!(
                    target: event_names::INGEST_DROPPED_RECORD,
                    record = i,
                    timestamp = %record.timestamp,
                    "dropping record with unparseable timestamp"
                );
            }
        }
    }
    if dropped > 0 {
        warn!(
            target: event_names::INGEST_DROPPED_RECORD,
            dropped, "records dropped during aggregation"
        );
    }

    let Some(first) = parsed.iter().map(|(ts, _)| *ts).min() else {
        return Ok(AggregatedSeries {
            series: ValueSeries {
                points: Vec::new(),
                using_weights,
                interval: Some(interval),
            },
            dropped,
        });
    };

    let anchor = bucket_anchor(first, interval.unit);
    // Leading empty buckets between the anchor and the first record are skipped.
    let offset = bucket_index(anchor, first, interval);
    let mut sums: Vec<f64> = Vec::new();
    for (ts, weight) in &parsed {
        let idx = bucket_index(anchor, *ts, interval) - offset;
        if idx >= MAX_BUCKETS {
            return Err(IngestError::Malformed(format!(
                "records span more than {} {} buckets",
                MAX_BUCKETS, interval
            )));
        }
        if idx >= sums.len() {
            sums.resize(idx + 1, 0.0);
        }
        sums[idx] += weight;
    }

    let points = sums
        .into_iter()
        .enumerate()
        .map(|(k, value)| {
            bucket_start(anchor, k + offset, interval)
                .map(|timestamp| SeriesPoint { timestamp, value })
                .ok_or_else(|| {
                    IngestError::Malformed(format!("bucket {} overflows the calendar", k))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        target: event_names::INGEST_FINISHED,
        buckets = points.len(),
        records = parsed.len(),
        dropped,
        "aggregated series"
    );

    Ok(AggregatedSeries {
        series: ValueSeries {
            points,
            using_weights,
            interval: Some(interval),
        },
        dropped,
    })
}

fn bucket_anchor(first: DateTime<Utc>, unit: IntervalUnit) -> DateTime<Utc> {
    let day = first.date_naive();
    let date = match unit {
        IntervalUnit::Hour | IntervalUnit::Day => day,
        IntervalUnit::Week => {
            day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
        }
        IntervalUnit::Month => day.with_day(1).unwrap_or(day),
    };
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn bucket_index(anchor: DateTime<Utc>, ts: DateTime<Utc>, interval: Interval) -> usize {
    let count = i64::from(interval.count);
    let steps = match interval.unit {
        IntervalUnit::Hour => (ts - anchor).num_hours() / count,
        IntervalUnit::Day => (ts - anchor).num_days() / count,
        IntervalUnit::Week => (ts - anchor).num_days() / (7 * count),
        IntervalUnit::Month => {
            let months = i64::from(ts.year() - anchor.year()) * 12 + i64::from(ts.month())
                - i64::from(anchor.month());
            months / count
        }
    };
    usize::try_from(steps).unwrap_or(usize::MAX)
}

/// Start of the `k`-th bucket after `anchor`. Months are added from the
/// anchor each time, so day-of-month does not drift.
pub(super) fn bucket_start(
    anchor: DateTime<Utc>,
    k: usize,
    interval: Interval,
) -> Option<DateTime<Utc>> {
    let steps = i64::try_from(k).ok()?.checked_mul(i64::from(interval.count))?;
    match interval.unit {
        IntervalUnit::Hour => anchor.checked_add_signed(Duration::try_hours(steps)?),
        IntervalUnit::Day => anchor.checked_add_signed(Duration::try_days(steps)?),
        IntervalUnit::Week => anchor.checked_add_signed(Duration::try_weeks(steps)?),
        IntervalUnit::Month => anchor.checked_add_months(Months::new(u32::try_from(steps).ok()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::read_records;
    use aw_config::IngestConfig;

    fn batch(text: &str) -> RecordBatch {
        read_records(text, &IngestConfig::default()).unwrap()
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_daily_sum_fills_gaps() {
        let b = batch(
            r#"[
            {"datetime_of_article": "2024-01-03 09:00:00", "nummentions": 2},
            {"datetime_of_article": "2024-01-01 10:00:00", "nummentions": 3},
            {"datetime_of_article": "2024-01-01 23:59:59", "nummentions": 4}
        ]"#,
        );
        let agg = aggregate(&b, Interval::DAILY).unwrap();
        assert!(agg.using_weights());
        assert_eq!(agg.series.values(), vec![7.0, 0.0, 2.0]);
        assert_eq!(agg.series.points[0].timestamp, ts("2024-01-01T00:00:00Z"));
        assert_eq!(agg.series.points[2].timestamp, ts("2024-01-03T00:00:00Z"));
    }

    #[test]
    fn test_event_counts_without_weights() {
        let b = batch(
            "{\"datetime_of_article\": \"2024-01-01\"}\n{\"datetime_of_article\": \"2024-01-01\"}\n{\"datetime_of_article\": \"2024-01-02\"}",
        );
        let agg = aggregate(&b, Interval::DAILY).unwrap();
        assert!(!agg.using_weights());
        assert_eq!(agg.series.values(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_bad_timestamps_dropped_and_counted() {
        let b = batch(
            r#"[
            {"datetime_of_article": "2024-01-01"},
            {"datetime_of_article": "garbage"},
            {"datetime_of_article": null},
            {"datetime_of_article": "2024-01-02"}
        ]"#,
        );
        let agg = aggregate(&b, Interval::DAILY).unwrap();
        assert_eq!(agg.dropped, 2);
        assert_eq!(agg.series.values(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_six_hour_buckets_anchor_at_midnight() {
        let b = batch(
            r#"[
            {"datetime_of_article": "2024-01-01 07:00:00"},
            {"datetime_of_article": "2024-01-01 11:59:00"},
            {"datetime_of_article": "2024-01-01 12:00:00"}
        ]"#,
        );
        let agg = aggregate(&b, "6H".parse().unwrap()).unwrap();
        assert_eq!(agg.series.points[0].timestamp, ts("2024-01-01T06:00:00Z"));
        assert_eq!(agg.series.values(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_weekly_buckets_start_monday() {
        // 2024-01-03 is a Wednesday; its week starts Monday 2024-01-01.
        let b = batch(
            r#"[
            {"datetime_of_article": "2024-01-03"},
            {"datetime_of_article": "2024-01-07"},
            {"datetime_of_article": "2024-01-08"}
        ]"#,
        );
        let agg = aggregate(&b, "1W".parse().unwrap()).unwrap();
        assert_eq!(agg.series.points[0].timestamp, ts("2024-01-01T00:00:00Z"));
        assert_eq!(agg.series.values(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_monthly_buckets() {
        let b = batch(
            r#"[
            {"datetime_of_article": "2024-01-31"},
            {"datetime_of_article": "2024-03-01"}
        ]"#,
        );
        let agg = aggregate(&b, "1M".parse().unwrap()).unwrap();
        assert_eq!(agg.series.values(), vec![1.0, 0.0, 1.0]);
        assert_eq!(agg.series.points[1].timestamp, ts("2024-02-01T00:00:00Z"));
    }

    #[test]
    fn test_empty_batch_gives_empty_series() {
        let agg = aggregate(&RecordBatch::default(), Interval::DAILY).unwrap();
        assert!(agg.series.is_empty());
        assert_eq!(agg.dropped, 0);
    }

    #[test]
    fn test_by_entity() {
        let mut fields = IngestConfig::default();
        fields.entity_field = Some("country".into());
        let b = read_records(
            r#"[
            {"datetime_of_article": "2024-01-01", "country": "FR"},
            {"datetime_of_article": "2024-01-02", "country": "DE"},
            {"datetime_of_article": "2024-01-03", "country": "FR"}
        ]"#,
            &fields,
        )
        .unwrap();
        let per = aggregate_by_entity(&b, Interval::DAILY).unwrap();
        let keys: Vec<&String> = per.keys().collect();
        assert_eq!(keys, vec!["DE", "FR"]);
        assert_eq!(per["FR"].series.values(), vec![1.0, 0.0, 1.0]);
        assert_eq!(per["DE"].series.values(), vec![1.0]);
    }
}
