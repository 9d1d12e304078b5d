//! CLI support for pipette
//!
//! Provides programmatic access to the `pipette` commands so they can be
//! embedded in other tools and tested without spawning a process.

mod docs;
mod run;

pub use docs::{DocCategory, get_doc_category, get_docs_overview};
pub use run::{
    CheckResult, RunOptions, execute_check, execute_run, load_pipeline, parse_collection,
};

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::PipelineError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// The pipeline failed to parse or validate
    #[error("invalid pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    /// JSON parsing error
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML pipeline file parsing error
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A named file could not be read
    #[error("cannot read '{}': {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input provided
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    /// An input item is valid JSON but not an object
    #[error("input item {0} is not a JSON object")]
    NotADocument(usize),

    /// Unknown documentation category
    #[error("Unknown category: '{0}'\nRun 'pipette docs' to see available categories.")]
    UnknownCategory(String),
}
