use serde_json::Value;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::record::{value_kind, Record};

use super::Stage;

/// Head-of-pipeline gate admitting only field-map records.
///
/// Admitted records receive a `validated = true` marker so downstream
/// stages can rely on the shape having been checked once.
pub struct ValidateStage;

impl Stage for ValidateStage {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn apply(&self, record: &Record) -> Result<Record> {
        match record.payload() {
            Value::Null => Err(PipelineError::MissingData),
            Value::Object(fields) => {
                debug!(field_count = fields.len(), "record admitted");
                Ok(record.with_field("validated", Value::Bool(true)))
            }
            other => Err(PipelineError::InvalidShape(value_kind(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admits_field_map_and_stamps_marker() {
        let record = Record::new(json!({"sensor": "temp", "value": 23.5}));
        let admitted = ValidateStage.apply(&record).unwrap();

        assert_eq!(admitted.field("validated"), Some(&json!(true)));
        assert_eq!(admitted.field("sensor"), Some(&json!("temp")));
        // the caller's record is untouched
        assert_eq!(record.field("validated"), None);
    }

    #[test]
    fn test_rejects_missing_record() {
        let record = Record::new(json!(null));
        let err = ValidateStage.apply(&record).unwrap_err();
        assert!(matches!(err, PipelineError::MissingData));
    }

    #[test]
    fn test_rejects_non_map_payload() {
        let record = Record::new(json!("123"));
        let err = ValidateStage.apply(&record).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidShape("string")));

        let record = Record::new(json!([1, 2, 3]));
        let err = ValidateStage.apply(&record).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidShape("array")));
    }
}
