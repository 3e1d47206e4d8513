//! Aggregation interval specifications such as `1D`, `6H` or `1M`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar unit of an aggregation interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Hour,
    Day,
    Week,
    Month,
}

impl IntervalUnit {
    fn suffix(&self) -> char {
        match self {
            IntervalUnit::Hour => 'H',
            IntervalUnit::Day => 'D',
            IntervalUnit::Week => 'W',
            IntervalUnit::Month => 'M',
        }
    }
}

/// A fixed aggregation interval: `count` × `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub count: u32,
    pub unit: IntervalUnit,
}

impl Interval {
    pub const DAILY: Interval = Interval {
        count: 1,
        unit: IntervalUnit::Day,
    };

    pub fn new(count: u32, unit: IntervalUnit) -> Self {
        Self { count, unit }
    }

    /// Human label used in chart titles ("Daily", "6-Hour", ...).
    pub fn label(&self) -> String {
        match (self.count, self.unit) {
            (1, IntervalUnit::Hour) => "Hourly".to_string(),
            (6, IntervalUnit::Hour) => "6-Hour".to_string(),
            (12, IntervalUnit::Hour) => "12-Hour".to_string(),
            (1, IntervalUnit::Day) => "Daily".to_string(),
            (1, IntervalUnit::Week) => "Weekly".to_string(),
            (1, IntervalUnit::Month) => "Monthly".to_string(),
            _ => self.to_string(),
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::DAILY
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("interval '{}' has no unit (expected H, D, W or M)", s))?;
        let (digits, unit) = s.split_at(split);

        let count = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<u32>()
                .map_err(|e| format!("invalid interval count '{}': {}", digits, e))?
        };
        if count == 0 {
            return Err(format!("interval '{}' must have a count of at least 1", s));
        }

        let unit = match unit.to_ascii_uppercase().as_str() {
            "H" => IntervalUnit::Hour,
            "D" => IntervalUnit::Day,
            "W" => IntervalUnit::Week,
            "M" => IntervalUnit::Month,
            other => return Err(format!("unknown interval unit '{}'", other)),
        };

        Ok(Interval { count, unit })
    }
}

impl Serialize for Interval {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_intervals() {
        assert_eq!("1D".parse::<Interval>().unwrap(), Interval::DAILY);
        assert_eq!(
            "6h".parse::<Interval>().unwrap(),
            Interval::new(6, IntervalUnit::Hour)
        );
        assert_eq!(
            "W".parse::<Interval>().unwrap(),
            Interval::new(1, IntervalUnit::Week)
        );
        assert_eq!(
            "3M".parse::<Interval>().unwrap(),
            Interval::new(3, IntervalUnit::Month)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Interval>().is_err());
        assert!("10".parse::<Interval>().is_err());
        assert!("0D".parse::<Interval>().is_err());
        assert!("1Y".parse::<Interval>().is_err());
        assert!("1DD".parse::<Interval>().is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Interval::DAILY.label(), "Daily");
        assert_eq!(Interval::new(12, IntervalUnit::Hour).label(), "12-Hour");
        assert_eq!(Interval::new(2, IntervalUnit::Day).label(), "2D");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Interval::new(6, IntervalUnit::Hour)).unwrap();
        assert_eq!(json, "\"6H\"");
        let back: Interval = serde_json::from_str("\"1M\"").unwrap();
        assert_eq!(back, Interval::new(1, IntervalUnit::Month));
    }
}
