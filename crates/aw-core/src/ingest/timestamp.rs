use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Datetime layouts tried, in order, for textual timestamps without an
/// explicit offset. Naive values are taken as UTC.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a record timestamp.
///
/// Accepts RFC 3339 strings, common `YYYY-MM-DD[ HH:MM:SS]` layouts, and
/// compact digit forms (`YYYYMMDD`, `YYYYMMDDHHMMSS`) either as strings or
/// as JSON integers. Returns `None` for anything else.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_str(s.trim()),
        Value::Number(n) => n.as_u64().and_then(|v| parse_compact(&v.to_string())),
        _ => None,
    }
}

fn parse_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(s);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// `YYYYMMDD` or `YYYYMMDDHHMMSS`.
fn parse_compact(s: &str) -> Option<DateTime<Utc>> {
    let field = |range: std::ops::Range<usize>| s.get(range)?.parse::<u32>().ok();
    let (h, mi, sec) = match s.len() {
        8 => (0, 0, 0),
        14 => (field(8..10)?, field(10..12)?, field(12..14)?),
        _ => return None,
    };
    let year = s.get(0..4)?.parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?;
    date.and_hms_opt(h, mi, sec).map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn ymd_hms(v: Value) -> Option<(i32, u32, u32, u32, u32, u32)> {
        parse_timestamp(&v).map(|dt| {
            (
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second(),
            )
        })
    }

    #[test]
    fn test_rfc3339_with_offset() {
        assert_eq!(
            ymd_hms(json!("2024-03-01T23:30:00-02:00")),
            Some((2024, 3, 2, 1, 30, 0))
        );
    }

    #[test]
    fn test_space_separated_and_fractional() {
        assert_eq!(
            ymd_hms(json!("2024-03-01 12:05:09")),
            Some((2024, 3, 1, 12, 5, 9))
        );
        assert_eq!(
            ymd_hms(json!("2024-03-01T12:05:09.250")),
            Some((2024, 3, 1, 12, 5, 9))
        );
    }

    #[test]
    fn test_date_only() {
        assert_eq!(ymd_hms(json!("2024-03-01")), Some((2024, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn test_compact_forms() {
        assert_eq!(ymd_hms(json!(20240301)), Some((2024, 3, 1, 0, 0, 0)));
        assert_eq!(ymd_hms(json!("20240301")), Some((2024, 3, 1, 0, 0, 0)));
        assert_eq!(
            ymd_hms(json!("20240301134501")),
            Some((2024, 3, 1, 13, 45, 1))
        );
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(ymd_hms(json!("not a date")), None);
        assert_eq!(ymd_hms(json!("")), None);
        assert_eq!(ymd_hms(json!("20241301")), None);
        assert_eq!(ymd_hms(json!(123)), None);
        assert_eq!(ymd_hms(json!(null)), None);
        assert_eq!(ymd_hms(json!(true)), None);
    }
}
