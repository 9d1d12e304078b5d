use thiserror::Error;

/// Errors raised while building or validating a pipeline.
///
/// Every variant is a configuration error: it is reported before any document
/// is processed and is never recoverable by retrying. Data problems met during
/// evaluation (absent fields, non-numeric values) are not errors; each stage
/// applies its documented fallback instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A dotted field path could not be parsed
    #[error("invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A stage carries missing or malformed parameters
    #[error("invalid {stage} stage: {message}")]
    InvalidStage {
        stage: &'static str,
        message: String,
    },

    /// The stage name is not one this engine evaluates
    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    /// The pipeline literal is not shaped like a pipeline at all
    #[error("malformed pipeline: {0}")]
    Malformed(String),

    /// Wraps another error with the position of the offending stage
    #[error("stage {index}: {source}")]
    AtStage {
        index: usize,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub(crate) fn invalid(stage: &'static str, message: impl Into<String>) -> Self {
        PipelineError::InvalidStage {
            stage,
            message: message.into(),
        }
    }

    /// Attach the zero-based stage position. Already positioned errors are kept as is.
    pub fn at_stage(self, index: usize) -> Self {
        match self {
            positioned @ PipelineError::AtStage { .. } => positioned,
            other => PipelineError::AtStage {
                index,
                source: Box::new(other),
            },
        }
    }

    /// The stage position, when known.
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            PipelineError::AtStage { index, .. } => Some(*index),
            _ => None,
        }
    }
}
