//! Parse MongoDB-style stage literals into a typed [`Pipeline`].
//!
//! ```text
//! [
//!   { "$group": { "_id": "$favoriteFruit", "count": { "$sum": 1 } } },
//!   { "$sort": { "count": -1 } },
//!   { "$limit": 5 }
//! ]
//! ```
//!
//! Field references are strings starting with `$`. Every structural problem is
//! reported as a [`PipelineError`] carrying the stage position; nothing is
//! deferred to execution time.

use serde_json::{Map, Value as Json};

use crate::{
    convert::json_to_value,
    error::PipelineError,
    path::FieldPath,
    stage::{
        Accumulator, AvgFallback, Condition, DatePart, Expression, GroupKey, Pattern, Pipeline,
        Predicate, SortKey, SortOrder, Stage, SumOperand,
    },
    value::Value,
};

type JsonObject = Map<String, Json>;

impl Pipeline {
    /// Parse a pipeline from its JSON text.
    ///
    /// ```
    /// use pipette::Pipeline;
    ///
    /// let pipeline = Pipeline::parse(r#"[{"$match": {"isActive": true}}, {"$count": "n"}]"#)?;
    /// assert_eq!(pipeline.len(), 2);
    /// # Ok::<(), pipette::PipelineError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let json: Json =
            serde_json::from_str(text).map_err(|e| PipelineError::Malformed(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Build a pipeline from an already decoded JSON array of stage literals.
    pub fn from_json(json: &Json) -> Result<Self, PipelineError> {
        let Json::Array(literals) = json else {
            return Err(PipelineError::Malformed(format!(
                "a pipeline must be an array of stages, got {}",
                json_type(json)
            )));
        };

        let stages = literals
            .iter()
            .enumerate()
            .map(|(index, literal)| parse_stage(literal).map_err(|e| e.at_stage(index)))
            .collect::<Result<Vec<_>, _>>()?;

        Pipeline::from_stages(stages)
    }
}

/// Parse one `{ "$kind": <spec> }` literal.
pub fn parse_stage(literal: &Json) -> Result<Stage, PipelineError> {
    let Json::Object(obj) = literal else {
        return Err(PipelineError::Malformed(format!(
            "a stage must be an object, got {}",
            json_type(literal)
        )));
    };
    let mut entries = obj.iter();
    let (Some((name, spec)), None) = (entries.next(), entries.next()) else {
        return Err(PipelineError::Malformed(format!(
            "a stage must have exactly one key, got {}",
            obj.len()
        )));
    };

    match name.as_str() {
        "$match" => parse_match(spec),
        "$group" => parse_group(spec),
        "$sort" => parse_sort(spec),
        "$limit" => Ok(Stage::Limit(integer_param("$limit", spec)?)),
        "$skip" => Ok(Stage::Skip(integer_param("$skip", spec)?)),
        "$count" => match spec {
            Json::String(field) => Stage::count(field),
            other => Err(PipelineError::invalid(
                "$count",
                format!("expected a field name string, got {}", json_type(other)),
            )),
        },
        "$project" => parse_project(spec),
        "$unwind" => parse_unwind(spec),
        "$addFields" | "$set" => parse_add_fields(spec),
        other => Err(PipelineError::UnknownStage(other.to_string())),
    }
}

fn parse_match(spec: &Json) -> Result<Stage, PipelineError> {
    let obj = object_param("$match", spec)?;
    let mut predicates = Vec::with_capacity(obj.len());

    for (field, condition) in obj {
        if field.starts_with('$') {
            return Err(PipelineError::invalid(
                "$match",
                format!("top-level operator '{field}' is not supported"),
            ));
        }
        let path = FieldPath::parse(field)?;
        match condition {
            Json::Object(ops) if is_operator_object(ops) => {
                for condition in parse_operators(ops)? {
                    predicates.push(Predicate {
                        path: path.clone(),
                        condition,
                    });
                }
            }
            literal => predicates.push(Predicate {
                path,
                condition: Condition::Eq(json_to_value(literal.clone())),
            }),
        }
    }

    Stage::match_all(predicates)
}

fn is_operator_object(obj: &JsonObject) -> bool {
    !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) && !obj.contains_key("$date")
}

fn parse_operators(ops: &JsonObject) -> Result<Vec<Condition>, PipelineError> {
    let mut conditions = Vec::with_capacity(ops.len());
    let options = match ops.get("$options") {
        None => "",
        Some(Json::String(flags)) => flags.as_str(),
        Some(other) => {
            return Err(PipelineError::invalid(
                "$match",
                format!("$options must be a string, got {}", json_type(other)),
            ));
        }
    };

    for (op, operand) in ops {
        let literal = || json_to_value(operand.clone());
        let condition = match op.as_str() {
            "$eq" => Condition::Eq(literal()),
            "$ne" => Condition::Ne(literal()),
            "$gt" => Condition::Gt(literal()),
            "$gte" => Condition::Gte(literal()),
            "$lt" => Condition::Lt(literal()),
            "$lte" => Condition::Lte(literal()),
            "$in" => Condition::In(array_operand(op, operand)?),
            "$nin" => Condition::Nin(array_operand(op, operand)?),
            "$all" => Condition::All(array_operand(op, operand)?),
            "$exists" => match operand {
                Json::Bool(b) => Condition::Exists(*b),
                Json::Number(n) => Condition::Exists(n.as_f64() != Some(0.0)),
                other => {
                    return Err(PipelineError::invalid(
                        "$match",
                        format!("$exists expects a boolean, got {}", json_type(other)),
                    ));
                }
            },
            "$regex" => match operand {
                Json::String(pattern) => Condition::Regex(Pattern::new(pattern, options)?),
                other => {
                    return Err(PipelineError::invalid(
                        "$match",
                        format!("$regex expects a string, got {}", json_type(other)),
                    ));
                }
            },
            "$options" if ops.contains_key("$regex") => continue,
            "$options" => {
                return Err(PipelineError::invalid("$match", "$options without $regex"));
            }
            other => {
                return Err(PipelineError::invalid(
                    "$match",
                    format!("unknown operator '{other}'"),
                ));
            }
        };
        conditions.push(condition);
    }

    Ok(conditions)
}

fn array_operand(op: &str, operand: &Json) -> Result<Vec<Value>, PipelineError> {
    match operand {
        Json::Array(items) => Ok(items.iter().cloned().map(json_to_value).collect()),
        other => Err(PipelineError::invalid(
            "$match",
            format!("{op} expects an array, got {}", json_type(other)),
        )),
    }
}

fn parse_group(spec: &Json) -> Result<Stage, PipelineError> {
    let obj = object_param("$group", spec)?;
    let key_spec = obj
        .get("_id")
        .ok_or_else(|| PipelineError::invalid("$group", "an _id expression is required"))?;
    let key = parse_group_key(key_spec)?;

    let mut accumulators = Vec::with_capacity(obj.len().saturating_sub(1));
    for (name, acc_spec) in obj.iter().filter(|(name, _)| name.as_str() != "_id") {
        accumulators.push((name.as_str(), parse_accumulator(name, acc_spec)?));
    }

    Stage::group(key, accumulators)
}

fn parse_group_key(spec: &Json) -> Result<GroupKey, PipelineError> {
    match spec {
        Json::Null => Ok(GroupKey::Null),
        Json::String(s) if s.starts_with('$') => Ok(GroupKey::Field(field_reference("$group", spec)?)),
        Json::Object(obj) if obj.len() == 1 && is_operator_object(obj) => {
            let (op, operand) = obj.iter().next().ok_or_else(|| {
                PipelineError::invalid("$group", "empty _id operator")
            })?;
            let part = DatePart::from_operator(op).ok_or_else(|| {
                PipelineError::invalid("$group", format!("unsupported _id operator '{op}'"))
            })?;
            Ok(GroupKey::DatePart(part, field_reference("$group", operand)?))
        }
        Json::Object(obj) if !obj.is_empty() && !is_operator_object(obj) => {
            let parts = obj
                .iter()
                .map(|(name, sub)| Ok((name.clone(), parse_group_key(sub)?)))
                .collect::<Result<Vec<_>, PipelineError>>()?;
            Ok(GroupKey::Compound(parts))
        }
        other => Ok(GroupKey::Literal(json_to_value(other.clone()))),
    }
}

fn parse_accumulator(name: &str, spec: &Json) -> Result<Accumulator, PipelineError> {
    let obj = match spec {
        Json::Object(obj) if obj.len() == 1 => obj,
        _ => {
            return Err(PipelineError::invalid(
                "$group",
                format!("field '{name}' must be a single accumulator object like {{\"$sum\": 1}}"),
            ));
        }
    };
    let Some((op, operand)) = obj.iter().next() else {
        return Err(PipelineError::invalid("$group", format!("field '{name}' is empty")));
    };

    match op.as_str() {
        "$sum" => match operand {
            Json::Number(_) => Ok(Accumulator::Sum(SumOperand::Constant(json_to_value(
                operand.clone(),
            )))),
            _ => Ok(Accumulator::Sum(SumOperand::Field(field_reference(
                "$group", operand,
            )?))),
        },
        "$avg" => parse_avg(operand),
        "$push" => Ok(Accumulator::Push(field_reference("$group", operand)?)),
        "$min" => Ok(Accumulator::Min(field_reference("$group", operand)?)),
        "$max" => Ok(Accumulator::Max(field_reference("$group", operand)?)),
        "$first" => Ok(Accumulator::First(field_reference("$group", operand)?)),
        other => Err(PipelineError::invalid(
            "$group",
            format!("unknown accumulator '{other}' for field '{name}'"),
        )),
    }
}

/// `"$age"` excludes missing values; `{"$ifNull": ["$age", 0]}` substitutes 0.
fn parse_avg(operand: &Json) -> Result<Accumulator, PipelineError> {
    if let Some((path, default)) = if_null_operand("$group", operand)? {
        let Some(default) = default.as_float() else {
            return Err(PipelineError::invalid(
                "$group",
                format!("$avg fallback must be a number, got {}", default.type_name()),
            ));
        };
        return Ok(Accumulator::Avg {
            path,
            fallback: AvgFallback::Default(default),
        });
    }
    Ok(Accumulator::Avg {
        path: field_reference("$group", operand)?,
        fallback: AvgFallback::Exclude,
    })
}

/// Recognize `{"$ifNull": ["$field", <default>]}`.
fn if_null_operand(
    stage: &'static str,
    operand: &Json,
) -> Result<Option<(FieldPath, Value)>, PipelineError> {
    let Json::Object(obj) = operand else {
        return Ok(None);
    };
    let Some(args) = obj.get("$ifNull") else {
        return Ok(None);
    };
    match args {
        Json::Array(pair) if obj.len() == 1 && pair.len() == 2 => Ok(Some((
            field_reference(stage, &pair[0])?,
            json_to_value(pair[1].clone()),
        ))),
        _ => Err(PipelineError::invalid(
            stage,
            "$ifNull expects [\"$field\", default]",
        )),
    }
}

fn parse_sort(spec: &Json) -> Result<Stage, PipelineError> {
    let obj = object_param("$sort", spec)?;
    let keys = obj
        .iter()
        .map(|(field, direction)| {
            let order = match direction.as_i64() {
                Some(1) => SortOrder::Ascending,
                Some(-1) => SortOrder::Descending,
                _ => {
                    return Err(PipelineError::invalid(
                        "$sort",
                        format!("direction for '{field}' must be 1 or -1"),
                    ));
                }
            };
            Ok(SortKey {
                path: FieldPath::parse(field)?,
                order,
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;
    Stage::sort(keys)
}

fn parse_project(spec: &Json) -> Result<Stage, PipelineError> {
    let obj = object_param("$project", spec)?;
    let mut paths = Vec::with_capacity(obj.len());
    for (field, flag) in obj {
        let include = match flag {
            Json::Bool(b) => *b,
            Json::Number(n) => n.as_f64() != Some(0.0),
            other => {
                return Err(PipelineError::invalid(
                    "$project",
                    format!(
                        "'{field}' must be 1/true (computed fields are not supported), got {}",
                        json_type(other)
                    ),
                ));
            }
        };
        match (include, field.as_str()) {
            (true, _) => paths.push(FieldPath::parse(field)?),
            // only explicitly listed fields are kept, so excluding _id is a no-op
            (false, "_id") => {}
            (false, _) => {
                return Err(PipelineError::invalid(
                    "$project",
                    format!("exclusion of '{field}' is not supported"),
                ));
            }
        }
    }
    let stage = Stage::Project(paths);
    stage.validate()?;
    Ok(stage)
}

fn parse_unwind(spec: &Json) -> Result<Stage, PipelineError> {
    match spec {
        Json::String(_) => Ok(Stage::Unwind(field_reference("$unwind", spec)?)),
        Json::Object(obj) => {
            if let Some(extra) = obj.keys().find(|k| k.as_str() != "path") {
                return Err(PipelineError::invalid(
                    "$unwind",
                    format!("option '{extra}' is not supported"),
                ));
            }
            let path = obj
                .get("path")
                .ok_or_else(|| PipelineError::invalid("$unwind", "a path is required"))?;
            Ok(Stage::Unwind(field_reference("$unwind", path)?))
        }
        other => Err(PipelineError::invalid(
            "$unwind",
            format!("expected a field reference, got {}", json_type(other)),
        )),
    }
}

fn parse_add_fields(spec: &Json) -> Result<Stage, PipelineError> {
    let obj = object_param("$addFields", spec)?;
    let fields = obj
        .iter()
        .map(|(field, expr)| Ok((FieldPath::parse(field)?, parse_expression(expr)?)))
        .collect::<Result<Vec<_>, PipelineError>>()?;
    let stage = Stage::AddFields(fields);
    stage.validate()?;
    Ok(stage)
}

fn parse_expression(spec: &Json) -> Result<Expression, PipelineError> {
    match spec {
        Json::String(s) if s.starts_with('$') => {
            Ok(Expression::Field(field_reference("$addFields", spec)?))
        }
        Json::Object(obj) if obj.len() == 1 && is_operator_object(obj) => {
            let Some((op, operand)) = obj.iter().next() else {
                return Err(PipelineError::invalid("$addFields", "empty expression"));
            };
            match op.as_str() {
                "$size" => match if_null_operand("$addFields", operand)? {
                    Some((path, Value::Array(default))) => Ok(Expression::SizeIfNull(path, default)),
                    Some((_, other)) => Err(PipelineError::invalid(
                        "$addFields",
                        format!("$size fallback must be an array, got {}", other.type_name()),
                    )),
                    None => Ok(Expression::Size(field_reference("$addFields", operand)?)),
                },
                "$ifNull" => match if_null_operand("$addFields", spec)? {
                    Some((path, default)) => Ok(Expression::IfNull(path, default)),
                    None => Err(PipelineError::invalid(
                        "$addFields",
                        "$ifNull expects [\"$field\", default]",
                    )),
                },
                "$literal" => Ok(Expression::Literal(json_to_value(operand.clone()))),
                op => match DatePart::from_operator(op) {
                    Some(part) => Ok(Expression::DatePart(
                        part,
                        field_reference("$addFields", operand)?,
                    )),
                    None => Err(PipelineError::invalid(
                        "$addFields",
                        format!("unsupported expression operator '{op}'"),
                    )),
                },
            }
        }
        literal => Ok(Expression::Literal(json_to_value(literal.clone()))),
    }
}

/// Parse `"$field.path"` into a FieldPath.
fn field_reference(stage: &'static str, spec: &Json) -> Result<FieldPath, PipelineError> {
    match spec {
        Json::String(s) => match s.strip_prefix('$') {
            Some(path) => FieldPath::parse(path),
            None => Err(PipelineError::invalid(
                stage,
                format!("field reference '{s}' must start with '$'"),
            )),
        },
        other => Err(PipelineError::invalid(
            stage,
            format!("expected a field reference string, got {}", json_type(other)),
        )),
    }
}

fn object_param<'a>(stage: &'static str, spec: &'a Json) -> Result<&'a JsonObject, PipelineError> {
    match spec {
        Json::Object(obj) => Ok(obj),
        other => Err(PipelineError::invalid(
            stage,
            format!("expected an object, got {}", json_type(other)),
        )),
    }
}

fn integer_param(stage: &'static str, spec: &Json) -> Result<i64, PipelineError> {
    json_to_value(spec.clone()).as_int().ok_or_else(|| {
        PipelineError::invalid(
            stage,
            format!("expected an integer, got {}", json_type(spec)),
        )
    })
}

fn json_type(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
