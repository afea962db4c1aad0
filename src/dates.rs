// Date helpers shared by records, metrics and quality checks.
//
// Source files come from spreadsheets and dashboard exports, so dates show up
// as YYYY-MM-DD, MM/DD/YYYY or full timestamps. Values stay as raw strings in
// the records and are parsed on demand.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// Parse a date or timestamp. Empty and unparseable values yield `None`.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Parse an optional raw field.
pub fn parse_opt(raw: Option<&String>) -> Option<NaiveDateTime> {
    raw.and_then(|s| parse_datetime(s))
}

/// True when the field holds text that is not a recognised date.
pub fn is_unparseable(raw: Option<&String>) -> bool {
    match raw {
        Some(s) if !s.trim().is_empty() => parse_datetime(s).is_none(),
        _ => false,
    }
}

/// Whole days between two instants, floored (`later - earlier`).
pub fn days_between(earlier: NaiveDateTime, later: NaiveDateTime) -> i64 {
    (later - earlier).num_seconds().div_euclid(86_400)
}

/// Mean of the values, `None` when empty.
pub fn mean(values: impl IntoIterator<Item = i64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0i64, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

/// Boolean cell: true/false, 1/0, yes/no in any case. Anything else is `None`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Numeric cell. Non-finite values are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Optional scalar column kept as text: accepts strings, numbers and
/// booleans alike so a malformed cell never fails the row.
pub fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(ScalarVisitor)
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, number or boolean")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}

/// Optional text column: blank cells become `None`.
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_and_us_dates() {
        let iso = parse_datetime("2024-07-09").unwrap();
        let us = parse_datetime("07/09/2024").unwrap();
        assert_eq!(iso, us);
    }

    #[test]
    fn test_parse_timestamps() {
        assert!(parse_datetime("2024-07-09 13:45:00").is_some());
        assert!(parse_datetime("2024-07-09T13:45:00").is_some());
        assert!(parse_datetime("2024-07-09T13:45:00+02:00").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("   ").is_none());
        assert!(parse_datetime("next tuesday").is_none());
        assert!(parse_datetime("2024-13-40").is_none());
    }

    #[test]
    fn test_days_between_floors() {
        let start = parse_datetime("2024-07-01 00:00:00").unwrap();
        let end = parse_datetime("2024-07-02 12:00:00").unwrap();
        assert_eq!(days_between(start, end), 1);

        // Negative spans floor toward -inf, so half a day back is -1
        let back = parse_datetime("2024-06-30 12:00:00").unwrap();
        assert_eq!(days_between(start, back), -1);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(vec![1, 2, 3]), Some(2.0));
        assert_eq!(mean(Vec::<i64>::new()), None);
    }

    #[test]
    fn test_parse_flag_and_number() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag(" no "), Some(false));
        assert_eq!(parse_flag("pending"), None);
        assert_eq!(parse_number("3000"), Some(3000.0));
        assert_eq!(parse_number("$3,000"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_is_unparseable() {
        assert!(!is_unparseable(None));
        assert!(!is_unparseable(Some(&"".to_string())));
        assert!(!is_unparseable(Some(&"2024-07-01".to_string())));
        assert!(is_unparseable(Some(&"soon".to_string())));
    }
}
