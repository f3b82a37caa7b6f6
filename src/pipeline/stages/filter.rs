use serde_json::Value;
use tracing::debug;

use crate::config::StageDef;
use crate::error::{PipelineError, Result};
use crate::record::{value_kind, Record};

use super::Stage;

/// Criterion applied to each entry of the target batch field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterRule {
    /// Keep string entries equal to the given value.
    Equals(String),
    /// Keep numeric entries at or above the threshold.
    AtLeast(f64),
}

impl FilterRule {
    fn matches(&self, entry: &Value) -> bool {
        match self {
            FilterRule::Equals(want) => entry.as_str().map_or(false, |s| s == want),
            FilterRule::AtLeast(min) => entry.as_f64().map_or(false, |n| n >= *min),
        }
    }
}

/// Optional mid-pipeline stage thinning a batch field down to entries
/// matching a rule.
///
/// Records whose target field is absent or not an array pass through
/// unchanged; filtering is an opportunity, not a shape requirement.
pub struct FilterStage {
    field: String,
    rule: FilterRule,
}

impl FilterStage {
    pub fn new(field: impl Into<String>, rule: FilterRule) -> Self {
        FilterStage {
            field: field.into(),
            rule,
        }
    }

    /// Builds the stage from a declarative definition.
    pub fn from_def(def: &StageDef) -> Result<Self> {
        let field = def.field.clone().ok_or_else(|| {
            PipelineError::Config("filter stage requires a 'field' parameter".to_string())
        })?;
        let rule = match (&def.equals, def.at_least) {
            (Some(want), None) => FilterRule::Equals(want.clone()),
            (None, Some(min)) => FilterRule::AtLeast(min),
            _ => {
                return Err(PipelineError::Config(
                    "filter stage requires exactly one of 'equals' or 'at_least'".to_string(),
                ))
            }
        };
        Ok(FilterStage::new(field, rule))
    }
}

impl Stage for FilterStage {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn apply(&self, record: &Record) -> Result<Record> {
        let fields = record
            .fields()
            .ok_or_else(|| PipelineError::InvalidShape(value_kind(record.payload())))?;

        let Some(Value::Array(entries)) = fields.get(&self.field) else {
            return Ok(record.clone());
        };

        let kept: Vec<Value> = entries
            .iter()
            .filter(|entry| self.rule.matches(entry))
            .cloned()
            .collect();
        debug!(
            field = %self.field,
            kept = kept.len(),
            dropped = entries.len() - kept.len(),
            "batch filtered"
        );
        Ok(record.with_field(&self.field, Value::Array(kept)))
    }
}
