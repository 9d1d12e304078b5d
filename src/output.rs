//! JSON output serialization for pipeline results.
//!
//! This module provides JSON serialization with support for both compact and
//! pretty-printed output formats. Unlike `serde_json::Map`, document fields
//! are written in their stored order, so a `$group` result always starts with
//! `_id` and a `$project` result follows the projection list.
//!
//! # Features
//!
//! - **Compact output** via [`to_json()`] - minimal whitespace
//! - **Pretty output** via [`to_json_pretty()`] - 2-space indentation
//! - **Datetimes** - written as extended JSON, `{"$date": "<rfc3339>"}`
//! - **Non-finite floats** - written as `null`
//!
//! # Examples
//!
//! ```
//! use pipette::Value;
//! use pipette::output::{to_json, to_json_pretty};
//!
//! let value = Value::Integer(42);
//!
//! assert_eq!(to_json(&value), "42");
//! assert_eq!(to_json_pretty(&value), "42");
//! ```

use chrono::SecondsFormat;

use crate::{document::Document, value::Value};

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        let mut out = String::new();
        self.print_value(&mut out, value, 0);
        out
    }

    pub fn print_document(&self, doc: &Document) -> String {
        let mut out = String::new();
        self.print_object(&mut out, doc, 0);
        out
    }

    fn print_value(&self, out: &mut String, value: &Value, indent: usize) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Integer(n) => out.push_str(&n.to_string()),
            Value::Float(n) if n.is_finite() => out.push_str(&n.to_string()),
            Value::Float(_) => out.push_str("null"),
            Value::String(s) => self.print_string(out, s),
            Value::DateTime(dt) => {
                let mut wrapper = Document::with_capacity(1);
                wrapper.insert(
                    "$date",
                    dt.to_rfc3339_opts(SecondsFormat::Millis, true),
                );
                self.print_object(out, &wrapper, indent);
            }
            Value::Array(arr) => self.print_array(out, arr, indent),
            Value::Object(doc) => self.print_object(out, doc, indent),
        }
    }

    fn print_array(&self, out: &mut String, arr: &[Value], indent: usize) {
        if arr.is_empty() {
            out.push_str("[]");
            return;
        }

        out.push('[');
        for (i, item) in arr.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if self.pretty {
                out.push('\n');
                self.indent(out, indent + 1);
            }
            self.print_value(out, item, indent + 1);
        }
        if self.pretty {
            out.push('\n');
            self.indent(out, indent);
        }
        out.push(']');
    }

    fn print_object(&self, out: &mut String, doc: &Document, indent: usize) {
        if doc.is_empty() {
            out.push_str("{}");
            return;
        }

        out.push('{');
        for (i, (key, value)) in doc.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if self.pretty {
                out.push('\n');
                self.indent(out, indent + 1);
            }
            self.print_string(out, key);
            out.push(':');
            if self.pretty {
                out.push(' ');
            }
            self.print_value(out, value, indent + 1);
        }
        if self.pretty {
            out.push('\n');
            self.indent(out, indent);
        }
        out.push('}');
    }

    fn indent(&self, out: &mut String, level: usize) {
        for _ in 0..level {
            out.push_str("  ");
        }
    }

    fn print_string(&self, out: &mut String, s: &str) {
        out.push('"');
        for c in s.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        }
        out.push('"');
    }
}

/// Converts a Value to compact JSON.
///
/// ```
/// use pipette::{Document, Value};
/// use pipette::output::to_json;
///
/// let mut doc = Document::new();
/// doc.insert("_id", "male");
/// doc.insert("genderCount", 2);
///
/// assert_eq!(to_json(&Value::Object(doc)), r#"{"_id":"male","genderCount":2}"#);
/// ```
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Converts a Value to pretty-printed JSON with 2-space indentation.
///
/// ```
/// use pipette::{Document, Value};
/// use pipette::output::to_json_pretty;
///
/// let mut doc = Document::new();
/// doc.insert("count", 3);
///
/// assert_eq!(to_json_pretty(&Value::Object(doc)), "{\n  \"count\": 3\n}");
/// ```
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}

/// Converts a document to compact JSON, one line, suitable for JSON Lines.
pub fn document_to_json(doc: &Document) -> String {
    JsonPrinter::new(false).print_document(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn datetime_renders_as_extended_json() {
        let dt = Utc.with_ymd_and_hms(2014, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(
            to_json(&Value::DateTime(dt)),
            r#"{"$date":"2014-03-05T10:00:00.000Z"}"#
        );
    }

    #[test]
    fn nan_renders_as_null() {
        assert_eq!(to_json(&Value::Float(f64::NAN)), "null");
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(to_json(&Value::from("a\u{1}b")), r#""a\u0001b""#);
    }

    #[test]
    fn pretty_nested_array() {
        let value = Value::Array(vec![Value::Integer(1), Value::Array(vec![])]);
        assert_eq!(to_json_pretty(&value), "[\n  1,\n  []\n]");
    }
}
