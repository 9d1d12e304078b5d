use regex::{Regex, RegexBuilder};

use crate::{error::PipelineError, path::FieldPath, value::Value};

/// A compiled `$regex` pattern.
///
/// Patterns are anchored at the start of the string, also under the `m`
/// option: `^\+1 \(940\)` and `\+1 \(940\)` behave the same.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    options: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern with optional `$options` flags (`i`, `m`, `s`, `x`).
    pub fn new(source: &str, options: &str) -> Result<Self, PipelineError> {
        let mut builder = RegexBuilder::new(&format!(r"\A(?:{source})"));
        for flag in options.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => {
                    return Err(PipelineError::invalid(
                        "$match",
                        format!("unsupported regex option '{other}'"),
                    ));
                }
            };
        }
        let regex = builder
            .build()
            .map_err(|e| PipelineError::invalid("$match", format!("invalid regex: {e}")))?;
        Ok(Pattern {
            source: source.to_string(),
            options: options.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.options == other.options
    }
}

/// A test applied to the value a field path resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Equality; an array field also matches when one element is equal
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// Equal to any listed value
    In(Vec<Value>),
    Nin(Vec<Value>),
    /// The field is an array holding every listed value
    All(Vec<Value>),
    /// The field is a string matching the anchored pattern
    Regex(Pattern),
    /// Presence test: `Exists(true)` holds for any present value, including null
    Exists(bool),
}

impl Condition {
    /// Evaluate against a resolved field, `None` meaning absent.
    pub fn test(&self, value: Option<&Value>) -> bool {
        match self {
            Condition::Eq(expected) => value.is_some_and(|v| equals_or_contains(v, expected)),
            Condition::Ne(expected) => !value.is_some_and(|v| equals_or_contains(v, expected)),
            Condition::Gt(bound) => compares(value, bound, |o| o.is_gt()),
            Condition::Gte(bound) => compares(value, bound, |o| o.is_ge()),
            Condition::Lt(bound) => compares(value, bound, |o| o.is_lt()),
            Condition::Lte(bound) => compares(value, bound, |o| o.is_le()),
            Condition::In(options) => {
                value.is_some_and(|v| options.iter().any(|o| equals_or_contains(v, o)))
            }
            Condition::Nin(options) => {
                !value.is_some_and(|v| options.iter().any(|o| equals_or_contains(v, o)))
            }
            Condition::All(required) => match value {
                Some(Value::Array(items)) if !required.is_empty() => {
                    required.iter().all(|r| items.contains(r))
                }
                _ => false,
            },
            Condition::Regex(pattern) => match value {
                Some(Value::String(s)) => pattern.is_match(s),
                _ => false,
            },
            Condition::Exists(expected) => value.is_some() == *expected,
        }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            Condition::Eq(_) => "$eq",
            Condition::Ne(_) => "$ne",
            Condition::Gt(_) => "$gt",
            Condition::Gte(_) => "$gte",
            Condition::Lt(_) => "$lt",
            Condition::Lte(_) => "$lte",
            Condition::In(_) => "$in",
            Condition::Nin(_) => "$nin",
            Condition::All(_) => "$all",
            Condition::Regex(_) => "$regex",
            Condition::Exists(_) => "$exists",
        }
    }
}

fn equals_or_contains(value: &Value, expected: &Value) -> bool {
    if value == expected {
        return true;
    }
    match (value, expected) {
        (Value::Array(items), expected) if !matches!(expected, Value::Array(_)) => {
            items.contains(expected)
        }
        _ => false,
    }
}

fn compares(
    value: Option<&Value>,
    bound: &Value,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> bool {
    let Some(value) = value else {
        return false;
    };
    let direct = value.partial_cmp_same_type(bound).is_some_and(&accept);
    if direct {
        return true;
    }
    match value {
        Value::Array(items) if !matches!(bound, Value::Array(_)) => items
            .iter()
            .any(|item| item.partial_cmp_same_type(bound).is_some_and(&accept)),
        _ => false,
    }
}

/// One `field: condition` entry of a `$match` stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub path: FieldPath,
    pub condition: Condition,
}

impl Predicate {
    pub fn new(path: &str, condition: Condition) -> Result<Self, PipelineError> {
        Ok(Predicate {
            path: FieldPath::parse(path)?,
            condition,
        })
    }

    /// `field == value`
    pub fn eq(path: &str, value: impl Into<Value>) -> Result<Self, PipelineError> {
        Self::new(path, Condition::Eq(value.into()))
    }

    /// `field: { $all: [...] }`
    pub fn all(path: &str, values: Vec<Value>) -> Result<Self, PipelineError> {
        Self::new(path, Condition::All(values))
    }

    /// `field: { $regex: pattern }`, anchored at the start
    pub fn regex(path: &str, pattern: &str) -> Result<Self, PipelineError> {
        Self::new(path, Condition::Regex(Pattern::new(pattern, "")?))
    }

    pub fn matches(&self, doc: &crate::document::Document) -> bool {
        self.condition.test(doc.resolve(&self.path))
    }
}
