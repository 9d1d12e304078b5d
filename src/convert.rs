//! serde_json <-> pipette Value conversion.
//!
//! Extended JSON `{"$date": ...}` objects become [`Value::DateTime`]; the
//! payload may be an RFC 3339 string or milliseconds since the epoch.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{document::Document, value::Value};

/// Convert serde_json::Value to a pipette Value
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                n.as_f64().map(Value::Float).unwrap_or(Value::Null)
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            if let Some(dt) = extended_date(&obj) {
                return Value::DateTime(dt);
            }
            Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, json_to_value(v)))
                    .collect(),
            )
        }
    }
}

/// Convert a JSON object to a Document; other JSON values give `None`.
pub fn json_to_document(v: serde_json::Value) -> Option<Document> {
    match json_to_value(v) {
        Value::Object(doc) => Some(doc),
        _ => None,
    }
}

/// Convert a pipette Value to serde_json::Value, keeping field order.
pub fn value_to_json(v: Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::DateTime(dt) => {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(
                "$date".to_string(),
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
            serde_json::Value::Object(wrapper)
        }
        Value::Array(arr) => serde_json::Value::Array(arr.into_iter().map(value_to_json).collect()),
        Value::Object(doc) => serde_json::Value::Object(
            doc.into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

fn extended_date(obj: &serde_json::Map<String, serde_json::Value>) -> Option<DateTime<Utc>> {
    if obj.len() != 1 {
        return None;
    }
    match obj.get("$date")? {
        serde_json::Value::String(s) => parse_datetime(s),
        serde_json::Value::Number(n) => DateTime::<Utc>::from_timestamp_millis(n.as_i64()?),
        _ => None,
    }
}

/// Parse RFC 3339, also accepting offsets written without a colon (`+0000`).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
