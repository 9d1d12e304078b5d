use std::{borrow::Cow, fmt, str::FromStr};

use crate::error::PipelineError;

/// A segment in a dotted field path.
///
/// Segments are classified once at parse time. Whether a numeric segment
/// addresses an array element or an object key is decided during resolution,
/// by looking at the value it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object field access by name
    ///
    /// # Examples
    /// - `name` → `Field("name")`
    /// - `company.title` → `[Field("company"), Field("title")]`
    Field(String),

    /// Zero-based array element access
    ///
    /// # Examples
    /// - `tags.1` → `[Field("tags"), Index(1)]`
    ///
    /// # Note
    /// When applied to an object instead of an array, the index is used as a
    /// field name (`"1"`).
    Index(usize),
}

impl PathSegment {
    /// The segment as an object key.
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Field(name) => Cow::Borrowed(name),
            PathSegment::Index(index) => Cow::Owned(index.to_string()),
        }
    }
}

/// A parsed dotted field path such as `company.location.country` or `tags.1`.
///
/// Paths are parsed once, when a stage is built, so malformed paths surface as
/// configuration errors rather than at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a dotted path.
    ///
    /// ```
    /// use pipette::path::{FieldPath, PathSegment};
    ///
    /// let path = FieldPath::parse("tags.1").unwrap();
    /// assert_eq!(
    ///     path.segments(),
    ///     &[PathSegment::Field("tags".into()), PathSegment::Index(1)]
    /// );
    /// ```
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let invalid = |reason| PipelineError::InvalidPath {
            path: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(invalid("path is empty"));
        }
        if raw.starts_with('$') {
            return Err(invalid("path must not start with '$'"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(invalid("path contains an empty segment"));
            }
            segments.push(classify(part));
        }

        Ok(FieldPath {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the path has a single segment.
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }
}

fn classify(part: &str) -> PathSegment {
    // "01" stays a field name so that it round-trips as a key
    let canonical = part.len() == 1 || !part.starts_with('0');
    match part.parse::<usize>() {
        Ok(index) if canonical && part.bytes().all(|b| b.is_ascii_digit()) => {
            PathSegment::Index(index)
        }
        _ => PathSegment::Field(part.to_string()),
    }
}

impl FromStr for FieldPath {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
