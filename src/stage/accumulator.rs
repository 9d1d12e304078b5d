use crate::{error::PipelineError, path::FieldPath, value::Value};

/// What a `$sum` accumulator adds for each document.
#[derive(Debug, Clone, PartialEq)]
pub enum SumOperand {
    /// A numeric constant; `$sum: 1` counts documents
    Constant(Value),
    /// A field's numeric value; absent or non-numeric values add 0
    Field(FieldPath),
}

/// How `$avg` treats documents whose field is absent or null.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AvgFallback {
    /// Leave the document out of both the total and the divisor
    #[default]
    Exclude,
    /// Substitute this value and count the document (`$ifNull: ["$f", 0]`)
    Default(f64),
}

/// A per-group aggregate computed by a `$group` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(SumOperand),
    Avg { path: FieldPath, fallback: AvgFallback },
    /// Values in arrival order; absent values are skipped, nulls kept
    Push(FieldPath),
    Min(FieldPath),
    Max(FieldPath),
    /// The first document's value (null when absent)
    First(FieldPath),
}

impl Accumulator {
    /// `$sum: 1`
    pub fn count() -> Self {
        Accumulator::Sum(SumOperand::Constant(Value::Integer(1)))
    }

    /// `$sum: "$field"`
    pub fn sum(path: &str) -> Result<Self, PipelineError> {
        Ok(Accumulator::Sum(SumOperand::Field(FieldPath::parse(path)?)))
    }

    /// `$avg: "$field"`, excluding documents where the field is missing
    pub fn avg(path: &str) -> Result<Self, PipelineError> {
        Ok(Accumulator::Avg {
            path: FieldPath::parse(path)?,
            fallback: AvgFallback::Exclude,
        })
    }

    /// `$avg: { $ifNull: ["$field", default] }`
    pub fn avg_or(path: &str, default: f64) -> Result<Self, PipelineError> {
        Ok(Accumulator::Avg {
            path: FieldPath::parse(path)?,
            fallback: AvgFallback::Default(default),
        })
    }

    pub fn push(path: &str) -> Result<Self, PipelineError> {
        Ok(Accumulator::Push(FieldPath::parse(path)?))
    }

    pub fn min(path: &str) -> Result<Self, PipelineError> {
        Ok(Accumulator::Min(FieldPath::parse(path)?))
    }

    pub fn max(path: &str) -> Result<Self, PipelineError> {
        Ok(Accumulator::Max(FieldPath::parse(path)?))
    }

    pub fn first(path: &str) -> Result<Self, PipelineError> {
        Ok(Accumulator::First(FieldPath::parse(path)?))
    }

    pub fn operator(&self) -> &'static str {
        match self {
            Accumulator::Sum(_) => "$sum",
            Accumulator::Avg { .. } => "$avg",
            Accumulator::Push(_) => "$push",
            Accumulator::Min(_) => "$min",
            Accumulator::Max(_) => "$max",
            Accumulator::First(_) => "$first",
        }
    }

    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        match self {
            Accumulator::Sum(SumOperand::Constant(v)) if v.to_decimal().is_none() => {
                Err(PipelineError::invalid(
                    "$group",
                    format!("$sum constant must be a finite number, got {}", v.type_name()),
                ))
            }
            Accumulator::Avg {
                fallback: AvgFallback::Default(d),
                ..
            } if !d.is_finite() => Err(PipelineError::invalid(
                "$group",
                "$avg fallback must be a finite number",
            )),
            _ => Ok(()),
        }
    }
}
