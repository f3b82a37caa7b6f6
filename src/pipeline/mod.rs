pub mod manager;
pub mod stages;

pub use manager::{DispatchOutcome, DispatchReport, Manager, OutcomeSummary};
pub use stages::Stage;

use tracing::{debug, instrument, warn};

use crate::config::{PipelineDef, StageDef};
use crate::error::Result;
use crate::record::Record;

/// Ordered composition of stages applied to one record per invocation.
///
/// A pipeline is created empty and stages are appended afterwards; it holds
/// no record-specific state between invocations. The stage list is
/// append-only.
pub struct Pipeline {
    id: String,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(id: impl Into<String>) -> Self {
        Pipeline {
            id: id.into(),
            stages: Vec::new(),
        }
    }

    /// The canonical validate -> tag -> render composition.
    pub fn standard(id: impl Into<String>) -> Self {
        let mut pipeline = Pipeline::new(id);
        pipeline.add_stage(Box::new(stages::ValidateStage));
        pipeline.add_stage(Box::new(stages::TagStage));
        pipeline.add_stage(Box::new(stages::RenderStage));
        pipeline
    }

    /// Builds a pipeline from a declarative definition.
    pub fn from_def(def: &PipelineDef) -> Result<Self> {
        let mut pipeline = Pipeline::new(def.id.clone());
        for stage_def in &def.stages {
            pipeline.add_stage_def(stage_def)?;
        }
        Ok(pipeline)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Appends a stage to the ordered sequence.
    pub fn add_stage(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    /// Resolves and appends a declaratively-defined stage.
    ///
    /// The stage sequence is unchanged when the definition does not resolve.
    pub fn add_stage_def(&mut self, def: &StageDef) -> Result<()> {
        let stage = stages::build(def)?;
        self.stages.push(stage);
        Ok(())
    }

    /// Applies each stage in sequence order, feeding each stage's output to
    /// the next, and returns the final output.
    ///
    /// The first stage failure propagates to the caller; there is no retry.
    /// An empty pipeline returns the input unchanged.
    #[instrument(skip(self, record), fields(pipeline_id = %self.id))]
    pub fn run(&self, record: &Record) -> Result<Record> {
        let mut current = record.clone();
        for stage in &self.stages {
            match stage.apply(&current) {
                Ok(next) => {
                    debug!(stage = stage.name(), "stage applied");
                    current = next;
                }
                Err(e) => {
                    warn!(stage = stage.name(), error = %e, "stage rejected record");
                    return Err(e);
                }
            }
        }
        Ok(current)
    }
}
