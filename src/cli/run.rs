//! Execute pipelines against JSON input

use std::{fs, path::Path};

use serde_json::Value as Json;

use super::CliError;
use crate::{Document, Pipeline, convert::json_to_document, execute};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Inline pipeline JSON, or a path to a .json/.yaml/.yml file
    pub pipeline: String,
    /// The collection: a JSON array of objects or JSON Lines
    pub input: Option<String>,
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Stage names in pipeline order
    pub stages: Vec<&'static str>,
}

/// Load a pipeline from inline JSON or from a file.
///
/// Arguments starting with `[` are parsed as inline JSON. Anything else is a
/// path; `.yaml` and `.yml` files are read as YAML, others as JSON.
pub fn load_pipeline(arg: &str) -> Result<Pipeline, CliError> {
    let trimmed = arg.trim_start();
    if trimmed.starts_with('[') {
        return Ok(Pipeline::parse(trimmed)?);
    }

    let path = Path::new(arg);
    let text = fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let json: Json = if is_yaml {
        serde_yaml::from_str(&text)?
    } else {
        serde_json::from_str(&text)?
    };
    tracing::debug!(path = %path.display(), yaml = is_yaml, "pipeline file loaded");
    Ok(Pipeline::from_json(&json)?)
}

/// Parse a collection given as one JSON array of objects, or as a stream of
/// objects (JSON Lines).
pub fn parse_collection(text: &str) -> Result<Vec<Document>, CliError> {
    if text.trim_start().starts_with('[') {
        let items: Vec<Json> = serde_json::from_str(text)?;
        return into_documents(items);
    }

    let items = serde_json::Deserializer::from_str(text)
        .into_iter::<Json>()
        .collect::<Result<Vec<_>, _>>()?;
    into_documents(items)
}

fn into_documents(items: Vec<Json>) -> Result<Vec<Document>, CliError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| json_to_document(item).ok_or(CliError::NotADocument(i)))
        .collect()
}

/// Execute a pipeline run
pub fn execute_run(options: &RunOptions) -> Result<Vec<Document>, CliError> {
    // the pipeline is validated before the input is even parsed
    let pipeline = load_pipeline(&options.pipeline)?;
    let text = options.input.as_ref().ok_or(CliError::NoInput)?;
    let collection = parse_collection(text)?;
    tracing::debug!(documents = collection.len(), "collection loaded");
    Ok(execute(&collection, &pipeline)?)
}

/// Validate a pipeline without executing it
pub fn execute_check(pipeline: &str) -> Result<CheckResult, CliError> {
    let pipeline = load_pipeline(pipeline)?;
    Ok(CheckResult {
        stages: pipeline.stages().iter().map(|s| s.kind()).collect(),
    })
}
