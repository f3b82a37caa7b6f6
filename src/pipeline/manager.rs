use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::record::Record;

use super::Pipeline;

/// Registry that fans one record out to every registered pipeline and
/// collects one result per pipeline, in registration order.
#[derive(Default)]
pub struct Manager {
    pipelines: Vec<Pipeline>,
}

/// Result of one pipeline's run within a dispatch.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub pipeline_id: String,
    pub result: Result<Record>,
}

/// Serializable account of a whole dispatch.
#[derive(Debug, Serialize)]
pub struct DispatchReport {
    pub run_id: Uuid,
    pub dispatched_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<OutcomeSummary>,
}

/// One pipeline's line in a dispatch report.
#[derive(Debug, Serialize)]
pub struct OutcomeSummary {
    pub pipeline_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Manager {
    pub fn new() -> Self {
        Manager {
            pipelines: Vec::new(),
        }
    }

    /// Builds every configured pipeline and registers them in config order.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut manager = Manager::new();
        for def in &config.pipelines {
            manager.add_pipeline(Pipeline::from_def(def)?);
        }
        Ok(manager)
    }

    /// Registers a pipeline at the end of the dispatch order.
    pub fn add_pipeline(&mut self, pipeline: Pipeline) {
        self.pipelines.push(pipeline);
    }

    pub fn pipeline_ids(&self) -> Vec<&str> {
        self.pipelines.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Runs every registered pipeline against the same input record.
    ///
    /// Pipelines are independent failure domains: a failure is logged and
    /// carried in that pipeline's outcome, never propagated, so one
    /// malformed record cannot keep later pipelines from running.
    pub fn dispatch(&self, record: &Record) -> Vec<DispatchOutcome> {
        info!(pipelines = self.pipelines.len(), "dispatching record");

        let outcomes: Vec<DispatchOutcome> = self
            .pipelines
            .iter()
            .map(|pipeline| {
                let result = pipeline.run(record);
                if let Err(e) = &result {
                    warn!(pipeline_id = %pipeline.id(), error = %e, "pipeline rejected record");
                }
                DispatchOutcome {
                    pipeline_id: pipeline.id().to_string(),
                    result,
                }
            })
            .collect();

        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!(
            succeeded,
            failed = outcomes.len() - succeeded,
            "dispatch complete"
        );
        outcomes
    }

    /// Dispatches and folds the outcomes into a serializable report.
    pub fn dispatch_report(&self, record: &Record) -> DispatchReport {
        DispatchReport::from_outcomes(self.dispatch(record))
    }
}

impl DispatchReport {
    pub fn from_outcomes(outcomes: Vec<DispatchOutcome>) -> Self {
        let total = outcomes.len();
        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        let outcomes = outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(record) => OutcomeSummary {
                    pipeline_id: outcome.pipeline_id,
                    summary: record.summary().map(str::to_string),
                    error: None,
                },
                Err(e) => OutcomeSummary {
                    pipeline_id: outcome.pipeline_id,
                    summary: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        DispatchReport {
            run_id: Uuid::new_v4(),
            dispatched_at: Utc::now(),
            total,
            succeeded,
            failed: total - succeeded,
            outcomes,
        }
    }
}
