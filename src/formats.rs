//! ISO-8601 detection and parsing for date and datetime leaves

use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:?\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap()
});

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Check if a string looks like an ISO date (`YYYY-MM-DD`)
pub fn is_iso_date(value: &str) -> bool {
    value.len() == 10 && ISO_DATE_REGEX.is_match(value)
}

/// Check if a string looks like an ISO datetime
pub fn is_iso_datetime(value: &str) -> bool {
    value.len() >= 19 && ISO_DATETIME_REGEX.is_match(value)
}

/// Parse ISO-8601 text into a `Value::DateTime` or `Value::Date`.
///
/// Datetimes without an offset are taken as UTC. Returns `None` when the text
/// is neither.
pub fn parse_iso8601(text: &str) -> Option<Value> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::DateTime(dt));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(Value::DateTime(dt));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Value::DateTime(naive.and_utc().fixed_offset()));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(Value::Date)
}
