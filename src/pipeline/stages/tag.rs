use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::record::{value_kind, Category, Record};

use super::Stage;

/// Attaches the category tag that drives downstream dispatch.
///
/// Detection is purely key-presence based: whichever recognized key the
/// payload carries selects the category, values are not inspected.
pub struct TagStage;

impl Stage for TagStage {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn apply(&self, record: &Record) -> Result<Record> {
        let fields = record
            .fields()
            .ok_or_else(|| PipelineError::InvalidShape(value_kind(record.payload())))?;

        let category = Category::from_fields(fields).ok_or(PipelineError::UnknownCategory)?;
        debug!(category = %category, "record tagged");
        Ok(record.with_category(category))
    }
}
