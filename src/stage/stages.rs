use std::collections::HashSet;

use crate::{
    error::PipelineError,
    path::FieldPath,
    stage::{Accumulator, Expression, GroupKey, Predicate},
};

/// Direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One `(field, direction)` pair of a `$sort` stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub path: FieldPath,
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(path: &str) -> Result<Self, PipelineError> {
        Ok(SortKey {
            path: FieldPath::parse(path)?,
            order: SortOrder::Ascending,
        })
    }

    pub fn desc(path: &str) -> Result<Self, PipelineError> {
        Ok(SortKey {
            path: FieldPath::parse(path)?,
            order: SortOrder::Descending,
        })
    }
}

/// One step of a pipeline.
///
/// The variants are public so that stages can be matched on; build them
/// through the constructors, which validate parameters. The executor
/// re-validates every stage before processing any document, so a hand-built
/// invalid stage still fails before producing output.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents satisfying every predicate
    ///
    /// # Example
    /// ```text
    /// { $match: { isActive: true, tags: { $all: ["enim", "id"] } } }
    /// ```
    Match(Vec<Predicate>),

    /// Partition by key and compute named accumulators
    ///
    /// # Example
    /// ```text
    /// { $group: { _id: "$gender", genderCount: { $sum: 1 } } }
    /// ```
    Group {
        key: GroupKey,
        accumulators: Vec<(String, Accumulator)>,
    },

    /// Stable multi-key sort, first key primary
    Sort(Vec<SortKey>),

    /// Keep at most N leading documents; N <= 0 keeps none
    Limit(i64),

    /// Drop N leading documents; N <= 0 drops none
    Skip(i64),

    /// Collapse the input into `{ <name>: count }`
    Count(String),

    /// Keep only the listed fields
    Project(Vec<FieldPath>),

    /// One output document per array element
    Unwind(FieldPath),

    /// Set computed fields, passing everything else through
    AddFields(Vec<(FieldPath, Expression)>),
}

impl Stage {
    pub fn match_all(predicates: Vec<Predicate>) -> Result<Self, PipelineError> {
        Self::validated(Stage::Match(predicates))
    }

    pub fn group(
        key: GroupKey,
        accumulators: Vec<(&str, Accumulator)>,
    ) -> Result<Self, PipelineError> {
        Self::validated(Stage::Group {
            key,
            accumulators: accumulators
                .into_iter()
                .map(|(name, acc)| (name.to_string(), acc))
                .collect(),
        })
    }

    pub fn sort(keys: Vec<SortKey>) -> Result<Self, PipelineError> {
        Self::validated(Stage::Sort(keys))
    }

    pub fn limit(n: i64) -> Self {
        Stage::Limit(n)
    }

    pub fn skip(n: i64) -> Self {
        Stage::Skip(n)
    }

    pub fn count(name: &str) -> Result<Self, PipelineError> {
        Self::validated(Stage::Count(name.to_string()))
    }

    pub fn project(paths: &[&str]) -> Result<Self, PipelineError> {
        let paths = paths
            .iter()
            .map(|p| FieldPath::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        Self::validated(Stage::Project(paths))
    }

    pub fn unwind(path: &str) -> Result<Self, PipelineError> {
        Ok(Stage::Unwind(FieldPath::parse(path)?))
    }

    pub fn add_fields(fields: Vec<(&str, Expression)>) -> Result<Self, PipelineError> {
        let fields = fields
            .into_iter()
            .map(|(path, expr)| Ok((FieldPath::parse(path)?, expr)))
            .collect::<Result<Vec<_>, PipelineError>>()?;
        Self::validated(Stage::AddFields(fields))
    }

    fn validated(stage: Stage) -> Result<Self, PipelineError> {
        stage.validate()?;
        Ok(stage)
    }

    /// The stage's literal name, e.g. `$group`.
    pub fn kind(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::Group { .. } => "$group",
            Stage::Sort(_) => "$sort",
            Stage::Limit(_) => "$limit",
            Stage::Skip(_) => "$skip",
            Stage::Count(_) => "$count",
            Stage::Project(_) => "$project",
            Stage::Unwind(_) => "$unwind",
            Stage::AddFields(_) => "$addFields",
        }
    }

    /// Check the structural rules every stage kind imposes on its parameters.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let kind = self.kind();
        match self {
            Stage::Match(_) | Stage::Limit(_) | Stage::Skip(_) | Stage::Unwind(_) => Ok(()),
            Stage::Group { key, accumulators } => {
                key.validate()?;
                let mut seen = HashSet::new();
                for (name, acc) in accumulators {
                    check_output_name(kind, name)?;
                    if name == "_id" {
                        return Err(PipelineError::invalid(
                            kind,
                            "'_id' is reserved for the group key",
                        ));
                    }
                    if !seen.insert(name.as_str()) {
                        return Err(PipelineError::invalid(
                            kind,
                            format!("duplicate output field '{name}'"),
                        ));
                    }
                    acc.validate()?;
                }
                Ok(())
            }
            Stage::Sort(keys) => {
                if keys.is_empty() {
                    return Err(PipelineError::invalid(kind, "at least one sort key is required"));
                }
                let mut seen = HashSet::new();
                for key in keys {
                    if !seen.insert(key.path.as_str()) {
                        return Err(PipelineError::invalid(
                            kind,
                            format!("duplicate sort key '{}'", key.path),
                        ));
                    }
                }
                Ok(())
            }
            Stage::Count(name) => check_output_name(kind, name),
            Stage::Project(paths) => {
                if paths.is_empty() {
                    return Err(PipelineError::invalid(kind, "at least one field is required"));
                }
                Ok(())
            }
            Stage::AddFields(fields) => {
                if fields.is_empty() {
                    return Err(PipelineError::invalid(kind, "at least one field is required"));
                }
                Ok(())
            }
        }
    }
}

fn check_output_name(kind: &'static str, name: &str) -> Result<(), PipelineError> {
    if name.is_empty() {
        return Err(PipelineError::invalid(kind, "output field name must not be empty"));
    }
    if name.starts_with('$') {
        return Err(PipelineError::invalid(
            kind,
            format!("output field name '{name}' must not start with '$'"),
        ));
    }
    if name.contains('.') {
        return Err(PipelineError::invalid(
            kind,
            format!("output field name '{name}' must not contain '.'"),
        ));
    }
    Ok(())
}
