use chrono::Datelike;

use crate::{document::Document, error::PipelineError, path::FieldPath, value::Value};

/// A calendar component extracted from a datetime field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    DayOfMonth,
}

impl DatePart {
    pub fn operator(&self) -> &'static str {
        match self {
            DatePart::Year => "$year",
            DatePart::Month => "$month",
            DatePart::DayOfMonth => "$dayOfMonth",
        }
    }

    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "$year" => Some(DatePart::Year),
            "$month" => Some(DatePart::Month),
            "$dayOfMonth" => Some(DatePart::DayOfMonth),
            _ => None,
        }
    }

    /// Extract the component from a datetime value; other values give `None`.
    pub fn extract(&self, value: &Value) -> Option<Value> {
        let dt = value.as_datetime()?;
        let part = match self {
            DatePart::Year => i64::from(dt.year()),
            DatePart::Month => i64::from(dt.month()),
            DatePart::DayOfMonth => i64::from(dt.day()),
        };
        Some(Value::Integer(part))
    }
}

/// The `_id` expression of a `$group` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// `_id: null`, one group for the whole input
    Null,
    /// A constant key, which also yields a single group
    Literal(Value),
    /// `_id: "$field"`; documents missing the field share the null group
    Field(FieldPath),
    /// `_id: { $year: "$registered" }` and friends
    DatePart(DatePart, FieldPath),
    /// `_id: { a: <key>, b: <key> }`
    Compound(Vec<(String, GroupKey)>),
}

impl GroupKey {
    pub fn field(path: &str) -> Result<Self, PipelineError> {
        Ok(GroupKey::Field(FieldPath::parse(path)?))
    }

    pub fn year(path: &str) -> Result<Self, PipelineError> {
        Ok(GroupKey::DatePart(DatePart::Year, FieldPath::parse(path)?))
    }

    pub fn month(path: &str) -> Result<Self, PipelineError> {
        Ok(GroupKey::DatePart(DatePart::Month, FieldPath::parse(path)?))
    }

    /// The key value for one document.
    pub fn evaluate(&self, doc: &Document) -> Value {
        match self {
            GroupKey::Null => Value::Null,
            GroupKey::Literal(v) => v.clone(),
            GroupKey::Field(path) => doc.resolve(path).cloned().unwrap_or(Value::Null),
            GroupKey::DatePart(part, path) => match doc.resolve(path) {
                Some(value) => part.extract(value).unwrap_or_else(|| {
                    tracing::debug!(
                        path = %path,
                        found = value.type_name(),
                        "{} applied to a non-date value, grouping under null",
                        part.operator()
                    );
                    Value::Null
                }),
                None => Value::Null,
            },
            GroupKey::Compound(parts) => Value::Object(
                parts
                    .iter()
                    .map(|(name, key)| (name.clone(), key.evaluate(doc)))
                    .collect(),
            ),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if let GroupKey::Compound(parts) = self {
            if parts.is_empty() {
                return Err(PipelineError::invalid(
                    "$group",
                    "compound _id needs at least one field",
                ));
            }
            for (name, key) in parts {
                if name.is_empty() || name.starts_with('$') || name.contains('.') {
                    return Err(PipelineError::invalid(
                        "$group",
                        format!("invalid compound _id field name '{name}'"),
                    ));
                }
                key.validate()?;
            }
        }
        Ok(())
    }
}

/// A derived value computed by `$addFields`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    /// Copy of another field; absent stays absent
    Field(FieldPath),
    /// Array length, 0 when the field is absent or not an array
    Size(FieldPath),
    /// `$size` of `$ifNull: [field, default]`: the default array's length
    /// stands in when the field is absent or null
    SizeIfNull(FieldPath, Vec<Value>),
    /// The field's value, or the default when absent or null
    IfNull(FieldPath, Value),
    DatePart(DatePart, FieldPath),
}

impl Expression {
    pub fn size(path: &str) -> Result<Self, PipelineError> {
        Ok(Expression::Size(FieldPath::parse(path)?))
    }

    pub fn field(path: &str) -> Result<Self, PipelineError> {
        Ok(Expression::Field(FieldPath::parse(path)?))
    }

    /// Evaluate against a document. `None` leaves the target field unset.
    pub fn evaluate(&self, doc: &Document) -> Option<Value> {
        match self {
            Expression::Literal(v) => Some(v.clone()),
            Expression::Field(path) => doc.resolve(path).cloned(),
            Expression::Size(path) => Some(array_len(path, doc.resolve(path))),
            Expression::SizeIfNull(path, default) => match doc.resolve(path) {
                Some(v) if !v.is_null() => Some(array_len(path, Some(v))),
                _ => Some(Value::Integer(
                    i64::try_from(default.len()).unwrap_or(i64::MAX),
                )),
            },
            Expression::IfNull(path, default) => match doc.resolve(path) {
                Some(v) if !v.is_null() => Some(v.clone()),
                _ => Some(default.clone()),
            },
            Expression::DatePart(part, path) => {
                Some(doc.resolve(path).and_then(|v| part.extract(v)).unwrap_or(Value::Null))
            }
        }
    }
}

fn array_len(path: &FieldPath, value: Option<&Value>) -> Value {
    let size = match value {
        Some(Value::Array(items)) => items.len(),
        Some(other) => {
            tracing::debug!(
                path = %path,
                found = other.type_name(),
                "$size applied to a non-array value, using 0"
            );
            0
        }
        None => 0,
    };
    Value::Integer(i64::try_from(size).unwrap_or(i64::MAX))
}
