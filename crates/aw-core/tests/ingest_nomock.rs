//! Ingestion tests over realistic record documents (no mocks).

use aw_config::{IngestConfig, Interval};
use aw_core::engine::ActivityEngine;
use aw_core::ingest::{aggregate, aggregate_by_entity, read_records, IngestError, ValueSeries};
use aw_config::{EngineConfig, WindowConfig};

const MENTIONS_JSONL: &str = r#"
{"datetime_of_article": "2024-03-01 08:15:00", "nummentions": 3, "country": "FR"}
{"datetime_of_article": "2024-03-01 19:40:00", "nummentions": 2, "country": "DE"}
{"datetime_of_article": "2024-03-03T10:00:00Z", "nummentions": 5, "country": "FR"}
{"datetime_of_article": "not a date", "nummentions": 7, "country": "FR"}
{"datetime_of_article": 20240304, "nummentions": null, "country": "DE"}
"#;

fn fields() -> IngestConfig {
    IngestConfig::default()
}

mod records {
    use super::*;

    #[test]
    fn weighted_daily_series_with_gaps() {
        let batch = read_records(MENTIONS_JSONL, &fields()).unwrap();
        assert_eq!(batch.len(), 5);
        assert!(batch.using_weights);

        let agg = aggregate(&batch, Interval::DAILY).unwrap();
        assert_eq!(agg.dropped, 1);
        assert!(agg.using_weights());
        assert_eq!(agg.series.values(), vec![5.0, 0.0, 5.0, 0.0]);
        assert_eq!(
            agg.series.points[0].timestamp.to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
    }

    #[test]
    fn event_counts_without_weight_field() {
        let text = r#"[
            {"datetime_of_article": "2024-03-01"},
            {"datetime_of_article": "2024-03-01"},
            {"datetime_of_article": "2024-03-02"}
        ]"#;
        let batch = read_records(text, &fields()).unwrap();
        assert!(!batch.using_weights);
        let agg = aggregate(&batch, Interval::DAILY).unwrap();
        assert_eq!(agg.series.values(), vec![2.0, 1.0]);
    }

    #[test]
    fn split_by_entity() {
        let mut f = fields();
        f.entity_field = Some("country".to_string());
        let batch = read_records(MENTIONS_JSONL, &f).unwrap();
        assert_eq!(batch.entities(), vec!["DE".to_string(), "FR".to_string()]);

        let groups = aggregate_by_entity(&batch, Interval::DAILY).unwrap();
        assert_eq!(groups.keys().cloned().collect::<Vec<_>>(), vec!["DE", "FR"]);
        assert_eq!(groups["FR"].series.values(), vec![3.0, 0.0, 5.0]);
        assert_eq!(groups["FR"].dropped, 1);
        // DE: 2 mentions on the 1st, a null weight on the 4th.
        assert_eq!(groups["DE"].series.values(), vec![2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_timestamp_field_is_schema_error() {
        let text = r#"{"datetime_of_article": "2024-03-01", "nummentions": 1}
{"published": "2024-03-02", "nummentions": 1}"#;
        let err = read_records(text, &fields()).unwrap_err();
        assert!(matches!(err, IngestError::Schema(ref m) if m.contains("record 1")));
    }

    #[test]
    fn partial_weight_field_is_schema_error() {
        let text = r#"{"datetime_of_article": "2024-03-01", "nummentions": 1}
{"datetime_of_article": "2024-03-02"}"#;
        let err = read_records(text, &fields()).unwrap_err();
        assert!(matches!(err, IngestError::Schema(_)));
        let common: aw_common::Error = err.into();
        assert_eq!(common.code(), 21);
    }

    #[test]
    fn malformed_line_is_reported_with_line_number() {
        let text = "{\"datetime_of_article\": \"2024-03-01\"}\n{oops\n";
        let err = read_records(text, &fields()).unwrap_err();
        assert!(matches!(err, IngestError::Malformed(ref m) if m.contains("line 2")));
    }
}

mod series {
    use super::*;

    #[test]
    fn bare_point_array() {
        let text = r#"[
            {"timestamp": "2024-01-01T00:00:00Z", "value": 1},
            {"timestamp": "2024-01-02T00:00:00Z", "value": 4}
        ]"#;
        let s = ValueSeries::from_json_str(text).unwrap();
        assert_eq!(s.values(), vec![1.0, 4.0]);
        assert!(!s.using_weights);
    }

    #[test]
    fn full_document_keeps_flags() {
        let text = r#"{
            "points": [{"timestamp": "2024-01-01T00:00:00Z", "value": 2}],
            "using_weights": true,
            "interval": "1W"
        }"#;
        let s = ValueSeries::from_json_str(text).unwrap();
        assert!(s.using_weights);
        assert_eq!(s.interval.map(|i| i.to_string()), Some("1W".to_string()));
    }

    #[test]
    fn unordered_points_rejected() {
        let text = r#"[
            {"timestamp": "2024-01-02T00:00:00Z", "value": 1},
            {"timestamp": "2024-01-01T00:00:00Z", "value": 4}
        ]"#;
        let err = ValueSeries::from_json_str(text).unwrap_err();
        assert!(matches!(err, IngestError::Unordered { index: 1 }));
    }
}

#[test]
fn records_through_engine() {
    let mut lines = String::new();
    for day in 0..90 {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day);
        for _ in 0..(1 + day % 4) {
            lines.push_str(&format!(
                "{{\"datetime_of_article\": \"{}\"}}\n",
                date.format("%Y-%m-%d")
            ));
        }
    }
    let batch = read_records(&lines, &fields()).unwrap();
    let agg = aggregate(&batch, Interval::DAILY).unwrap();
    assert_eq!(agg.series.len(), 90);

    let engine = ActivityEngine::new(EngineConfig {
        start_idx: 30,
        expanding_window: 15,
        windows: vec![WindowConfig::new(7, "7 day")],
        ..EngineConfig::default()
    })
    .unwrap();
    let out = engine.run(&agg.series);
    assert_eq!(out.labels[0].summary.populated, 90 - 29);
    assert!(!out.using_weights);
}

#[test]
fn sparse_weekly_series_is_densified() {
    let text = r#"{"points": [
        {"timestamp": "2024-01-01T00:00:00Z", "value": 4},
        {"timestamp": "2024-01-22T00:00:00Z", "value": 6}
    ], "interval": "1W"}"#;
    let s = ValueSeries::from_json_str(text).unwrap();
    assert_eq!(s.values(), vec![4.0, 0.0, 0.0, 6.0]);

    let err = ValueSeries::from_json_str(&text.replace("2024-01-22", "2024-01-24")).unwrap_err();
    assert!(matches!(err, IngestError::OffGrid { index: 1, .. }));
    let common: aw_common::Error = err.into();
    assert_eq!(common.code(), 20);
}
