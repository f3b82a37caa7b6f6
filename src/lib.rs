//! Staged record pipelines with category-tagged dispatch.
//!
//! Records flow through ordered stages (validate, tag, optionally filter,
//! render); a [`Manager`] fans one record out to any number of pipelines
//! with per-pipeline failure isolation.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod record;

pub use config::{Config, PipelineDef, StageDef};
pub use error::{PipelineError, Result};
pub use pipeline::manager::{DispatchOutcome, DispatchReport, Manager, OutcomeSummary};
pub use pipeline::stages::{FilterRule, FilterStage, RenderStage, Stage, TagStage, ValidateStage};
pub use pipeline::Pipeline;
pub use record::{Category, FieldMap, Record};
