use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::FromPrimitive};

use crate::document::Document;

/// A value stored in a document field.
///
/// Integers and floats are kept as separate variants so that sums over
/// integer fields stay integers, but they compare numerically: `1 == 1.0`.
///
/// # Examples
///
/// ```
/// use pipette::{Document, Value};
///
/// let null = Value::Null;
/// let age = Value::Integer(42);
/// let score = Value::Float(3.5);
/// let tags = Value::Array(vec![Value::from("enim"), Value::from("id")]);
///
/// let mut company = Document::new();
/// company.insert("title", "ACME");
/// let nested = Value::Object(company);
///
/// assert_eq!(Value::Integer(1), Value::Float(1.0));
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// JSON null
    Null,

    /// true/false
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// UTC instant
    DateTime(DateTime<Utc>),

    /// Array of values (heterogeneous allowed)
    Array(Vec<Value>),

    /// Nested document
    Object(Document),
}

impl Value {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer (floats are accepted only when whole)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Object(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Exact decimal form of a finite number.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(n) => Some(Decimal::from(*n)),
            Value::Float(n) if n.is_finite() => Decimal::from_f64(*n),
            _ => None,
        }
    }

    /// Human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Position of the value's type in the cross-type sort order:
    /// null < numbers < strings < objects < arrays < booleans < dates.
    pub fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Integer(_) | Value::Float(_) => 1,
            Value::String(_) => 2,
            Value::Object(_) => 3,
            Value::Array(_) => 4,
            Value::Boolean(_) => 5,
            Value::DateTime(_) => 6,
        }
    }

    /// Total order used by sorting and by `$min`/`$max`.
    ///
    /// Values of different types order by [`Value::type_rank`]. Within a type,
    /// numbers compare numerically (NaN below every other number), strings
    /// lexicographically by bytes, arrays and objects element by element.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        let rank = self.type_rank().cmp(&other.type_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (a, b) if a.is_number() => compare_numbers(a, b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => compare_sequences(a, b),
            (Value::Object(a), Value::Object(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = va.canonical_cmp(vb).then_with(|| ka.cmp(kb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => Ordering::Equal,
        }
    }

    /// Ordering between values of the same type class, `None` otherwise.
    ///
    /// This is what range operators (`$gt`, `$lt`, ...) use: a string is
    /// never greater than a number.
    pub fn partial_cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        if self.type_rank() == other.type_rank() {
            Some(self.canonical_cmp(other))
        } else {
            None
        }
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    let (Some(x), Some(y)) = (a.as_float(), b.as_float()) else {
        return Ordering::Equal;
    };
    match x.partial_cmp(&y) {
        Some(ord) => ord,
        None => x.is_nan().cmp(&y.is_nan()).reverse(),
    }
}

fn compare_sequences(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = x.canonical_cmp(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Integer(_), Value::Float(_))
            | (Value::Float(_), Value::Integer(_))
            | (Value::Float(_), Value::Float(_)) => self.as_float() == other.as_float(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc)
    }
}
