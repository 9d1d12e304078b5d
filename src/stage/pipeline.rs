use crate::{document::Document, error::PipelineError, executor, stage::Stage};

/// An ordered sequence of stages, executed left to right.
///
/// Pipelines are built once and may be run against any number of
/// collections; they hold no per-execution state.
///
/// ```
/// use pipette::{Pipeline, Stage, stage::{Accumulator, GroupKey, SortKey}};
///
/// let top_fruits = Pipeline::new()
///     .then(Stage::group(GroupKey::field("favoriteFruit")?, vec![("count", Accumulator::count())])?)
///     .then(Stage::sort(vec![SortKey::desc("count")?])?)
///     .then(Stage::limit(5));
/// assert_eq!(top_fruits.len(), 3);
/// # Ok::<(), pipette::PipelineError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stages, validating each one.
    pub fn from_stages(stages: Vec<Stage>) -> Result<Self, PipelineError> {
        let pipeline = Pipeline { stages };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Append a stage.
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Validate every stage, reporting the first failure with its position.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (index, stage) in self.stages.iter().enumerate() {
            stage.validate().map_err(|e| e.at_stage(index))?;
        }
        Ok(())
    }

    /// Run the pipeline against a collection. See [`executor::execute`].
    pub fn execute(&self, collection: &[Document]) -> Result<Vec<Document>, PipelineError> {
        executor::execute(collection, self)
    }
}

impl FromIterator<Stage> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Pipeline {
            stages: iter.into_iter().collect(),
        }
    }
}
