use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Declarative pipeline configuration: the set of pipelines to register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub pipelines: Vec<PipelineDef>,
}

/// Definition of one pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDef {
    pub id: String,
    pub stages: Vec<StageDef>,
}

/// Definition of one stage inside a pipeline.
///
/// `kind` selects the stage implementation. The optional fields parameterize
/// the filter stage and are ignored by the other kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDef {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_least: Option<f64>,
}

impl StageDef {
    /// Bare definition with no parameters.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        StageDef {
            kind: kind.into(),
            field: None,
            equals: None,
            at_least: None,
        }
    }
}

impl Config {
    /// Loads and validates pipeline definitions from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// The built-in three-adapter set, each running the canonical stages.
    pub fn standard() -> Self {
        let canonical = vec![
            StageDef::of_kind("validate"),
            StageDef::of_kind("tag"),
            StageDef::of_kind("render"),
        ];
        Config {
            pipelines: ["json_adapter", "csv_adapter", "stream_adapter"]
                .into_iter()
                .map(|id| PipelineDef {
                    id: id.to_string(),
                    stages: canonical.clone(),
                })
                .collect(),
        }
    }

    /// Structural checks: unique pipeline ids, no stage-less pipelines.
    ///
    /// Stage kinds are resolved at build time, not here, so a config can be
    /// loaded and inspected even when the kinds it names are unknown.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for def in &self.pipelines {
            if !seen.insert(def.id.as_str()) {
                return Err(PipelineError::Config(format!(
                    "Duplicate pipeline id '{}'",
                    def.id
                )));
            }
            if def.stages.is_empty() {
                return Err(PipelineError::Config(format!(
                    "Pipeline '{}' must have at least one stage",
                    def.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_definitions() {
        let toml_content = r#"
            [[pipelines]]
            id = "json_adapter"
            stages = [ { kind = "validate" }, { kind = "tag" }, { kind = "render" } ]

            [[pipelines]]
            id = "alerts"
            stages = [
                { kind = "validate" },
                { kind = "tag" },
                { kind = "filter", field = "events", equals = "error" },
                { kind = "render" },
            ]
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.pipelines.len(), 2);
        assert_eq!(config.pipelines[0].id, "json_adapter");
        assert_eq!(config.pipelines[1].stages.len(), 4);

        let filter = &config.pipelines[1].stages[2];
        assert_eq!(filter.kind, "filter");
        assert_eq!(filter.field.as_deref(), Some("events"));
        assert_eq!(filter.equals.as_deref(), Some("error"));
        assert_eq!(filter.at_least, None);
    }

    #[test]
    fn test_standard_set() {
        let config = Config::standard();
        config.validate().unwrap();
        assert_eq!(config.pipelines.len(), 3);
        for def in &config.pipelines {
            let kinds: Vec<&str> = def.stages.iter().map(|s| s.kind.as_str()).collect();
            assert_eq!(kinds, vec!["validate", "tag", "render"]);
        }
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut config = Config::standard();
        config.pipelines[1].id = "json_adapter".to_string();
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_stage_list() {
        let mut config = Config::standard();
        config.pipelines[0].stages.clear();
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file_maps_to_config_error() {
        let err = Config::load("definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
