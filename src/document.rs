//! Ordered documents and field-path resolution.
//!
//! A [`Document`] keeps its fields in insertion order, so stage output such as
//! `{"_id": ..., "count": ...}` renders in the order the stage produced it.
//! Resolution distinguishes an absent field (`None`) from an explicit null
//! (`Some(&Value::Null)`).

use crate::{
    path::{FieldPath, PathSegment},
    value::Value,
};

/// An ordered mapping from field name to [`Value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Document {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Top-level field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a top-level field. An existing key keeps its position and the
    /// previous value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let position = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Resolve a dotted path to a value, or `None` when the path is absent.
    ///
    /// Numeric segments index into arrays; applied to an object they are
    /// plain field names. Any missing field, scalar intermediate, or
    /// out-of-range index makes the whole path absent.
    ///
    /// ```
    /// use pipette::{Document, Value, path::FieldPath};
    ///
    /// let mut doc = Document::new();
    /// doc.insert("tags", vec![Value::from("enim"), Value::from("ad")]);
    ///
    /// let second = FieldPath::parse("tags.1").unwrap();
    /// assert_eq!(doc.resolve(&second), Some(&Value::from("ad")));
    ///
    /// let missing = FieldPath::parse("tags.7").unwrap();
    /// assert_eq!(doc.resolve(&missing), None);
    /// ```
    pub fn resolve(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.get(&first.key())?;
        for segment in rest {
            current = step(current, segment)?;
        }
        Some(current)
    }

    /// Write `value` at a dotted path, creating intermediate objects.
    ///
    /// A scalar standing where an intermediate object is needed is replaced.
    /// Index segments descend into existing array elements; an index past the
    /// end of an array replaces the array with an object keyed by the index.
    pub fn set_path(&mut self, path: &FieldPath, value: Value) {
        self.set_segments(path.segments(), value);
    }

    fn set_segments(&mut self, segments: &[PathSegment], value: Value) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        let key = head.key();
        if rest.is_empty() {
            self.insert(key.into_owned(), value);
            return;
        }
        match self.get_mut(&key) {
            Some(child) => set_in_value(child, rest, value),
            None => {
                let mut child = Document::new();
                child.set_segments(rest, value);
                self.insert(key.into_owned(), Value::Object(child));
            }
        }
    }
}

fn step<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(doc), segment) => doc.get(&segment.key()),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn set_in_value(slot: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *slot = value;
        return;
    };

    if let Value::Array(items) = slot
        && let PathSegment::Index(index) = head
        && let Some(element) = items.get_mut(*index)
    {
        set_in_value(element, rest, value);
        return;
    }

    if let Value::Object(doc) = slot {
        doc.set_segments(segments, value);
        return;
    }

    let mut doc = Document::new();
    doc.set_segments(segments, value);
    *slot = Value::Object(doc);
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
