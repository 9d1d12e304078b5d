//! Pipeline execution.
//!
//! [`execute`] validates the whole pipeline, then threads an owned document
//! sequence through one evaluation function per stage kind. Stages never see
//! each other's state and the input collection is only read, so executions
//! may run in parallel without coordination.

mod group;

use std::cmp::Ordering;

use crate::{
    document::Document,
    error::PipelineError,
    path::FieldPath,
    stage::{Expression, Pipeline, Predicate, SortKey, SortOrder, Stage},
    value::Value,
};

/// Run `pipeline` against `collection` and return the final documents.
///
/// Every stage is validated before the first document is touched; a
/// structurally invalid stage is reported as a [`PipelineError`] and no
/// partial output is produced.
///
/// # Examples
///
/// ```
/// use pipette::{Document, Pipeline, Stage, Value, execute, stage::Predicate};
///
/// let users: Vec<Document> = [true, false, true]
///     .into_iter()
///     .map(|active| {
///         let mut doc = Document::new();
///         doc.insert("isActive", active);
///         doc
///     })
///     .collect();
///
/// let pipeline = Pipeline::new()
///     .then(Stage::match_all(vec![Predicate::eq("isActive", true)?])?)
///     .then(Stage::count("Active Users")?);
///
/// let result = execute(&users, &pipeline)?;
/// assert_eq!(result[0].get("Active Users"), Some(&Value::Integer(2)));
/// # Ok::<(), pipette::PipelineError>(())
/// ```
pub fn execute(collection: &[Document], pipeline: &Pipeline) -> Result<Vec<Document>, PipelineError> {
    pipeline.validate()?;

    let span = tracing::debug_span!(
        "pipeline",
        stages = pipeline.len(),
        input = collection.len()
    );
    let _guard = span.enter();

    let mut current = collection.to_vec();
    for (index, stage) in pipeline.stages().iter().enumerate() {
        let before = current.len();
        current = apply_stage(stage, current);
        tracing::trace!(
            index,
            stage = stage.kind(),
            before,
            after = current.len(),
            "stage applied"
        );
    }

    tracing::debug!(output = current.len(), "pipeline finished");
    Ok(current)
}

fn apply_stage(stage: &Stage, docs: Vec<Document>) -> Vec<Document> {
    match stage {
        Stage::Match(predicates) => apply_match(docs, predicates),
        Stage::Group { key, accumulators } => group::apply_group(docs, key, accumulators),
        Stage::Sort(keys) => apply_sort(docs, keys),
        Stage::Limit(n) => apply_limit(docs, *n),
        Stage::Skip(n) => apply_skip(docs, *n),
        Stage::Count(name) => apply_count(docs, name),
        Stage::Project(paths) => apply_project(docs, paths),
        Stage::Unwind(path) => apply_unwind(docs, path),
        Stage::AddFields(fields) => apply_add_fields(docs, fields),
    }
}

fn apply_match(docs: Vec<Document>, predicates: &[Predicate]) -> Vec<Document> {
    docs.into_iter()
        .filter(|doc| predicates.iter().all(|p| p.matches(doc)))
        .collect()
}

fn apply_sort(mut docs: Vec<Document>, keys: &[SortKey]) -> Vec<Document> {
    // Vec::sort_by is stable, ties keep their input order
    docs.sort_by(|a, b| compare_documents(a, b, keys));
    docs
}

/// Compare two documents on a list of sort keys, first key primary.
pub fn compare_documents(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ord = compare_resolved(a.resolve(&key.path), b.resolve(&key.path));
        let ord = match key.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Absent sorts before every present value, including null.
pub fn compare_resolved(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.canonical_cmp(y),
    }
}

fn apply_limit(mut docs: Vec<Document>, n: i64) -> Vec<Document> {
    if n <= 0 {
        return Vec::new();
    }
    docs.truncate(usize::try_from(n).unwrap_or(usize::MAX));
    docs
}

fn apply_skip(mut docs: Vec<Document>, n: i64) -> Vec<Document> {
    if n <= 0 {
        return docs;
    }
    let n = usize::try_from(n).unwrap_or(usize::MAX).min(docs.len());
    docs.drain(..n);
    docs
}

fn apply_count(docs: Vec<Document>, name: &str) -> Vec<Document> {
    let mut out = Document::with_capacity(1);
    out.insert(name, i64::try_from(docs.len()).unwrap_or(i64::MAX));
    vec![out]
}

fn apply_project(docs: Vec<Document>, paths: &[FieldPath]) -> Vec<Document> {
    docs.iter()
        .map(|doc| {
            let mut out = Document::with_capacity(paths.len());
            for path in paths {
                if let Some(value) = doc.resolve(path) {
                    out.set_path(path, value.clone());
                }
            }
            out
        })
        .collect()
}

fn apply_unwind(docs: Vec<Document>, path: &FieldPath) -> Vec<Document> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let items = match doc.resolve(path) {
            Some(Value::Array(items)) => Some(items.clone()),
            Some(Value::Null) | None => continue,
            // a present scalar unwinds to itself
            Some(_) => None,
        };
        let Some(items) = items else {
            out.push(doc);
            continue;
        };
        for item in items {
            let mut copy = doc.clone();
            copy.set_path(path, item);
            out.push(copy);
        }
    }
    out
}

fn apply_add_fields(docs: Vec<Document>, fields: &[(FieldPath, Expression)]) -> Vec<Document> {
    docs.into_iter()
        .map(|mut doc| {
            // all expressions see the incoming document, not each other's output
            let computed: Vec<Option<Value>> =
                fields.iter().map(|(_, expr)| expr.evaluate(&doc)).collect();
            for ((path, _), value) in fields.iter().zip(computed) {
                if let Some(value) = value {
                    doc.set_path(path, value);
                }
            }
            doc
        })
        .collect()
}
