//! Typed reads from a record's property bag.
//!
//! Extraction never fails: anything unexpected degrades to "no value" and is
//! logged at warn level so one bad cell cannot abort a run.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::models::Record;

/// Outcome of reading one property.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<T> {
    Value(T),
    /// Property missing or explicitly empty.
    Absent,
    /// Property present but not in the expected shape.
    Malformed(String),
}

impl<T> Extracted<T> {
    /// Collapses `Absent` and `Malformed` into `None`.
    pub fn ok(self) -> Option<T> {
        match self {
            Extracted::Value(v) => Some(v),
            Extracted::Absent | Extracted::Malformed(_) => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Extracted::Malformed(_))
    }
}

fn typed_property<'a>(record: &'a Record, field_id: &str, expected: &str) -> Extracted<&'a Value> {
    let Some(prop) = record.properties.get(field_id) else {
        return Extracted::Absent;
    };
    if prop.is_null() {
        return Extracted::Absent;
    }
    match prop.get("type").and_then(Value::as_str) {
        Some(kind) if kind == expected => match prop.get(expected) {
            None | Some(Value::Null) => Extracted::Absent,
            Some(inner) => Extracted::Value(inner),
        },
        Some(kind) => Extracted::Malformed(format!("expected {} property, found {}", expected, kind)),
        None => Extracted::Malformed("property has no type tag".to_string()),
    }
}

/// Reads a `number` property.
pub fn number_field(record: &Record, field_id: &str) -> Extracted<f64> {
    match typed_property(record, field_id, "number") {
        Extracted::Value(inner) => match inner.as_f64() {
            Some(n) => Extracted::Value(n),
            None => Extracted::Malformed(format!("number value is not numeric: {}", inner)),
        },
        Extracted::Absent => Extracted::Absent,
        Extracted::Malformed(reason) => Extracted::Malformed(reason),
    }
}

/// Reads the start of a `date` property.
pub fn date_field(record: &Record, field_id: &str) -> Extracted<DateTime<FixedOffset>> {
    match typed_property(record, field_id, "date") {
        Extracted::Value(inner) => match inner.get("start") {
            None | Some(Value::Null) => Extracted::Absent,
            Some(Value::String(start)) if start.is_empty() => Extracted::Absent,
            Some(Value::String(start)) => match parse_timestamp(start) {
                Some(ts) => Extracted::Value(ts),
                None => Extracted::Malformed(format!("unparseable date '{}'", start)),
            },
            Some(other) => Extracted::Malformed(format!("date start is not a string: {}", other)),
        },
        Extracted::Absent => Extracted::Absent,
        Extracted::Malformed(reason) => Extracted::Malformed(reason),
    }
}

/// Fail-soft number read; malformed values are logged and dropped.
pub fn extract_number(record: &Record, field_id: &str) -> Option<f64> {
    let extracted = number_field(record, field_id);
    if let Extracted::Malformed(reason) = &extracted {
        tracing::warn!(
            "Error extracting property {} from record {}: {}",
            field_id,
            record.id,
            reason
        );
    }
    extracted.ok()
}

/// Fail-soft date read; malformed values are logged and dropped.
pub fn extract_date(record: &Record, field_id: &str) -> Option<DateTime<FixedOffset>> {
    let extracted = date_field(record, field_id);
    if let Extracted::Malformed(reason) = &extracted {
        tracing::warn!(
            "Error extracting date property {} from record {}: {}",
            field_id,
            record.id,
            reason
        );
    }
    extracted.ok()
}

/// Parses ISO-8601. Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }

    let utc = FixedOffset::east_opt(0)?;
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc().with_timezone(&utc));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().with_timezone(&utc))
}
