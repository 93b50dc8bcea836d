//! Records are loosely typed rows: a map from field name to a json value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

pub const DEFAULT_KEY_FIELD: &str = "id";

/// Resolves a dot path (`owner.address.city`) inside a record.
/// Missing intermediate keys yield `None`, never an error.
pub fn resolve<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Identifier of a record under the given key field, rendered as string.
pub fn record_id(record: &Record, key_field: &str) -> Option<String> {
    match resolve(record, key_field)? {
        Value::Null => None,
        value => Some(display_value(value)),
    }
}

/// Plain string conversion of a value. Null renders empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<String>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if n.is_f64()
        && let Some(f) = n.as_f64()
        && f.fract() == 0.0
        && f.abs() < 1e15
    {
        return format!("{}", f as i64);
    }
    n.to_string()
}

/// Field value as string, empty when missing or null.
pub fn field_text(record: &Record, path: &str) -> String {
    resolve(record, path).map(display_value).unwrap_or_default()
}

/// Parses timestamps the way the browser `Date` constructor is commonly fed:
/// RFC 3339, ISO date-times without offset, plain dates and epoch milliseconds.
/// Values without offset are taken as UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|ts| ts.and_utc());
        }
    }
    None
}
