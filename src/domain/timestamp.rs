//! Date and timestamp representations used at the storage boundary
//!
//! Persisted timestamps are UTC with second precision (`YYYY-MM-DDTHH:MM:SSZ`).
//! Calendar dates are `YYYY-MM-DD`; the document store keeps them as midnight
//! timestamps so they compare with its native date ordering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Persisted timestamp format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Calendar date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Formats a date as the UTC midnight timestamp of that day
pub fn midnight_timestamp(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format(DATE_FORMAT))
}

/// Parses RFC 3339 timestamps as well as offset-less ones (assumed UTC)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parses a calendar date, accepting the date part of a timestamp
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date_naive()))
}

/// Serde adapter for `Option<DateTime<Utc>>` in the persisted format
///
/// `null`, a missing value and the empty string all decode as `None`.
pub mod optional_timestamp {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'"))),
        }
    }
}

/// Serde adapter for an optional date that is dropped when unparseable
pub mod lenient_date {
    use super::{parse_date, DATE_FORMAT};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parsed = match Value::deserialize(deserializer)? {
            Value::String(raw) => parse_date(&raw),
            _ => None,
        };
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_second_precision() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 13, 4, 59).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-05T13:04:59Z");
    }

    #[test]
    fn test_midnight_timestamp() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(midnight_timestamp(date), "2024-01-05T00:00:00Z");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 5, 13, 4, 59).unwrap();
        assert_eq!(parse_timestamp("2024-01-05T13:04:59Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-05T13:04:59+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-05T13:04:59"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-05 13:04:59.000"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_parse_date_accepts_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05"), Some(expected));
        assert_eq!(parse_date("2024-01-05T00:00:00Z"), Some(expected));
        assert_eq!(parse_date("05/01/2024"), None);
    }
}
