use crate::config::StageDef;
use crate::error::{PipelineError, Result};
use crate::record::Record;

mod filter;
mod render;
mod tag;
mod validate;

pub use filter::{FilterRule, FilterStage};
pub use render::RenderStage;
pub use tag::TagStage;
pub use validate::ValidateStage;

/// One transformation step in a pipeline.
///
/// Stages are stateless values: they carry configuration at most, never
/// per-run state, so one stage value can serve any number of pipelines and
/// invocations.
pub trait Stage: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Transforms a record into a new record, or fails.
    ///
    /// Implementations never mutate the input; the caller's record is valid
    /// and unchanged after a failure.
    fn apply(&self, record: &Record) -> Result<Record>;
}

/// Resolves a declarative stage definition into a runnable stage.
///
/// Fails with [`PipelineError::NotAStage`] for an unrecognized kind and with
/// a configuration error for a known kind missing its parameters.
pub fn build(def: &StageDef) -> Result<Box<dyn Stage>> {
    match def.kind.as_str() {
        "validate" => Ok(Box::new(ValidateStage)),
        "tag" => Ok(Box::new(TagStage)),
        "filter" => Ok(Box::new(FilterStage::from_def(def)?)),
        "render" => Ok(Box::new(RenderStage)),
        other => Err(PipelineError::NotAStage(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_resolves_known_kinds() {
        for kind in ["validate", "tag", "render"] {
            let stage = build(&StageDef::of_kind(kind)).unwrap();
            assert_eq!(stage.name(), kind);
        }
    }

    #[test]
    fn test_build_resolves_parameterized_filter() {
        let def = StageDef {
            kind: "filter".to_string(),
            field: Some("events".to_string()),
            equals: Some("error".to_string()),
            at_least: None,
        };
        let stage = build(&def).unwrap();
        assert_eq!(stage.name(), "filter");
    }

    #[test]
    fn test_build_rejects_unknown_kind() {
        match build(&StageDef::of_kind("compress")) {
            Err(PipelineError::NotAStage(kind)) => assert_eq!(kind, "compress"),
            Err(other) => panic!("expected NotAStage, got {:?}", other),
            Ok(stage) => panic!("expected NotAStage, built '{}'", stage.name()),
        }
    }

    #[test]
    fn test_build_rejects_unparameterized_filter() {
        assert!(matches!(
            build(&StageDef::of_kind("filter")),
            Err(PipelineError::Config(_))
        ));
    }
}
