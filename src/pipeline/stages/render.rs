use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::record::{value_kind, Category, FieldMap, Record};

use super::Stage;

/// Tail-of-pipeline stage rendering a human-readable summary string.
///
/// Dispatches exhaustively on the category tag attached upstream; every
/// number in a summary is computed from the record's own values.
pub struct RenderStage;

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn apply(&self, record: &Record) -> Result<Record> {
        let fields = record
            .fields()
            .ok_or_else(|| PipelineError::InvalidShape(value_kind(record.payload())))?;
        let category = record.category().ok_or(PipelineError::UnknownOutputType)?;

        let summary = match category {
            Category::Sensor => render_sensor(fields),
            Category::Activity => render_activity(fields),
            Category::Stream => render_stream(fields),
            Category::Ledger => render_ledger(fields),
        };
        debug!(category = %category, summary = %summary, "record rendered");
        Ok(record.with_summary(summary))
    }
}

/// Scalar readings name the value and unit; batches report count and mean.
fn render_sensor(fields: &FieldMap) -> String {
    let name = fields
        .get("sensor")
        .and_then(|v| v.as_str())
        .unwrap_or("sensor");
    let unit = fields.get("unit").and_then(|v| v.as_str()).unwrap_or("");

    if let Some(readings) = fields.get("readings").and_then(|v| v.as_array()) {
        let values: Vec<f64> = readings.iter().filter_map(|v| v.as_f64()).collect();
        if values.is_empty() {
            return format!("{}: 0 readings", name);
        }
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        return format!("{}: {} readings, avg: {:.1} {}", name, values.len(), avg, unit)
            .trim_end()
            .to_string();
    }

    match fields.get("value").and_then(|v| v.as_f64()) {
        Some(value) => format!("{} reading: {} {}", name, value, unit)
            .trim_end()
            .to_string(),
        None => format!("{}: 0 readings", name),
    }
}

fn render_activity(fields: &FieldMap) -> String {
    let action = fields
        .get("action")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let user = fields
        .get("user")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    format!("activity {} by {}", action, user)
}

fn render_stream(fields: &FieldMap) -> String {
    let name = fields
        .get("stream")
        .and_then(|v| v.as_str())
        .unwrap_or("stream");
    let events = fields.get("events").and_then(|v| v.as_array());
    let total = events.map_or(0, |e| e.len());
    let errors = events.map_or(0, |e| {
        e.iter().filter(|v| v.as_str() == Some("error")).count()
    });
    format!("{} stream: {} events, {} errors detected", name, total, errors)
}

/// Buys add to the net flow, sells subtract; other operation kinds count
/// toward the total but leave the net untouched.
fn render_ledger(fields: &FieldMap) -> String {
    let name = fields
        .get("ledger")
        .and_then(|v| v.as_str())
        .unwrap_or("ledger");

    let mut count = 0usize;
    let mut net = 0.0f64;
    if let Some(operations) = fields.get("operations").and_then(|v| v.as_array()) {
        for operation in operations {
            let Some(entry) = operation.as_object() else {
                continue;
            };
            count += 1;
            let amount = entry.get("amount").and_then(|v| v.as_f64()).unwrap_or(0.0);
            match entry.get("op").and_then(|v| v.as_str()) {
                Some("buy") => net += amount,
                Some("sell") => net -= amount,
                _ => {}
            }
        }
    }

    let flow = if net > 0.0 {
        format!("+{}", net)
    } else {
        format!("{}", net)
    };
    format!(
        "{} ledger: {} operations, net flow: {} units",
        name, count, flow
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagged(payload: serde_json::Value, category: Category) -> Record {
        Record::new(payload).with_category(category)
    }

    #[test]
    fn test_sensor_scalar_references_value_and_unit() {
        let record = tagged(
            json!({"sensor": "temp", "value": 23.5, "unit": "C"}),
            Category::Sensor,
        );
        let rendered = RenderStage.apply(&record).unwrap();
        assert_eq!(rendered.summary(), Some("temp reading: 23.5 C"));
    }

    #[test]
    fn test_sensor_scalar_without_unit() {
        let record = tagged(json!({"sensor": "rpm", "value": 900}), Category::Sensor);
        let rendered = RenderStage.apply(&record).unwrap();
        assert_eq!(rendered.summary(), Some("rpm reading: 900"));
    }

    #[test]
    fn test_sensor_batch_computes_average() {
        let record = tagged(
            json!({"sensor": "temp", "readings": [21.5, 23.0, 21.8], "unit": "C"}),
            Category::Sensor,
        );
        let rendered = RenderStage.apply(&record).unwrap();
        assert_eq!(rendered.summary(), Some("temp: 3 readings, avg: 22.1 C"));
    }

    #[test]
    fn test_sensor_empty_batch() {
        let record = tagged(json!({"sensor": "temp", "readings": []}), Category::Sensor);
        let rendered = RenderStage.apply(&record).unwrap();
        assert_eq!(rendered.summary(), Some("temp: 0 readings"));
    }

    #[test]
    fn test_activity_summary_references_action_and_user() {
        let record = tagged(json!({"action": "logged", "user": "x"}), Category::Activity);
        let rendered = RenderStage.apply(&record).unwrap();
        assert_eq!(rendered.summary(), Some("activity logged by x"));
    }

    #[test]
    fn test_stream_counts_events_and_errors() {
        let record = tagged(
            json!({"stream": "auth", "events": ["login", "error", "logout", "error"]}),
            Category::Stream,
        );
        let rendered = RenderStage.apply(&record).unwrap();
        assert_eq!(
            rendered.summary(),
            Some("auth stream: 4 events, 2 errors detected")
        );
    }

    #[test]
    fn test_ledger_net_flow_positive_gets_plus_sign() {
        let record = tagged(
            json!({"ledger": "acct-7", "operations": [
                {"op": "buy", "amount": 100},
                {"op": "sell", "amount": 75}
            ]}),
            Category::Ledger,
        );
        let rendered = RenderStage.apply(&record).unwrap();
        assert_eq!(
            rendered.summary(),
            Some("acct-7 ledger: 2 operations, net flow: +25 units")
        );
    }

    #[test]
    fn test_ledger_net_flow_negative_and_unknown_ops() {
        let record = tagged(
            json!({"ledger": "acct-7", "operations": [
                {"op": "buy", "amount": 10},
                {"op": "hold", "amount": 5},
                {"op": "sell", "amount": 30}
            ]}),
            Category::Ledger,
        );
        let rendered = RenderStage.apply(&record).unwrap();
        assert_eq!(
            rendered.summary(),
            Some("acct-7 ledger: 3 operations, net flow: -20 units")
        );
    }

    #[test]
    fn test_untagged_record_fails() {
        let record = Record::new(json!({"sensor": "temp", "value": 23.5}));
        let err = RenderStage.apply(&record).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownOutputType));
    }

    #[test]
    fn test_non_map_payload_fails_shape_check() {
        let record = Record::new(json!("123"));
        let err = RenderStage.apply(&record).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidShape("string")));
    }
}
