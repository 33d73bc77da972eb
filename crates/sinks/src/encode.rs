//! Outbound record encoding.
//!
//! Every sink ships the same record shape: `timestamp` (nanoseconds since
//! the epoch), `severity` (lowercase name), `application`, `hostname`,
//! `message`, `remoteAddress` and `metadata`. Empty fields are omitted.

use serde_json::{Map, Value};

use siphon_protocol::{LogEvent, MetaValue};

const FIELD_TIMESTAMP: &str = "timestamp";
const FIELD_SEVERITY: &str = "severity";
const FIELD_APPLICATION: &str = "application";
const FIELD_HOSTNAME: &str = "hostname";
const FIELD_TEXT: &str = "message";
const FIELD_REMOTE_ADDR: &str = "remoteAddress";
const FIELD_METADATA: &str = "metadata";

/// Encode one event as an outbound JSON record.
pub fn encode_record(event: &LogEvent) -> Value {
    let mut record = Map::new();

    record.insert(FIELD_TIMESTAMP.into(), Value::from(event.timestamp));
    record.insert(FIELD_SEVERITY.into(), Value::from(event.severity.as_str()));

    if !event.application.is_empty() {
        record.insert(FIELD_APPLICATION.into(), Value::from(event.application.clone()));
    }
    if !event.hostname.is_empty() {
        record.insert(FIELD_HOSTNAME.into(), Value::from(event.hostname.clone()));
    }
    if !event.text.is_empty() {
        record.insert(FIELD_TEXT.into(), Value::from(event.text.clone()));
    }
    if !event.remote_addr.is_empty() {
        record.insert(FIELD_REMOTE_ADDR.into(), Value::from(event.remote_addr.clone()));
    }
    if !event.metadata.is_empty() {
        let mut metadata = Map::new();
        for (key, value) in &event.metadata {
            metadata.insert(key.clone(), meta_value(value));
        }
        record.insert(FIELD_METADATA.into(), Value::Object(metadata));
    }

    Value::Object(record)
}

/// Encode a batch as NDJSON (one record per line, each line terminated).
pub fn encode_batch(events: &[LogEvent]) -> Vec<u8> {
    let mut out = Vec::with_capacity(events.len() * 256);
    for event in events {
        // Maps and strings cannot fail to serialize.
        if let Ok(line) = serde_json::to_vec(&encode_record(event)) {
            out.extend_from_slice(&line);
            out.push(b'\n');
        }
    }
    out
}

fn meta_value(value: &MetaValue) -> Value {
    match value {
        MetaValue::Str(s) => Value::from(s.clone()),
        MetaValue::Int(i) => Value::from(*i),
        MetaValue::Float(f) => Value::from(*f),
    }
}

#[cfg(test)]
mod tests {
    use siphon_protocol::{LogEvent, MetaValue, Severity};

    use super::{encode_batch, encode_record};

    fn event() -> LogEvent {
        LogEvent {
            remote_addr: "10.0.0.1".into(),
            timestamp: 1_500_000_000_000_000_000,
            severity: Severity::Warning,
            hostname: "web-1".into(),
            application: "nginx".into(),
            text: "upstream timed out".into(),
            metadata: [("upstream".to_string(), MetaValue::Str("10.0.0.9".into()))]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_record_fields() {
        let record = encode_record(&event());

        assert_eq!(record["timestamp"], 1_500_000_000_000_000_000i64);
        assert_eq!(record["severity"], "warning");
        assert_eq!(record["application"], "nginx");
        assert_eq!(record["hostname"], "web-1");
        assert_eq!(record["message"], "upstream timed out");
        assert_eq!(record["remoteAddress"], "10.0.0.1");
        assert_eq!(record["metadata"]["upstream"], "10.0.0.9");
    }

    #[test]
    fn test_empty_fields_omitted() {
        let record = encode_record(&LogEvent {
            timestamp: 1,
            severity: Severity::Info,
            ..Default::default()
        });

        let object = record.as_object().unwrap();
        assert!(object.contains_key("timestamp"));
        assert!(object.contains_key("severity"));
        assert!(!object.contains_key("application"));
        assert!(!object.contains_key("hostname"));
        assert!(!object.contains_key("message"));
        assert!(!object.contains_key("remoteAddress"));
        assert!(!object.contains_key("metadata"));
    }

    #[test]
    fn test_metadata_value_types() {
        let mut fixture = event();
        fixture
            .metadata
            .insert("count".into(), MetaValue::Int(42));
        fixture
            .metadata
            .insert("ratio".into(), MetaValue::Float(0.5));

        let record = encode_record(&fixture);
        assert_eq!(record["metadata"]["count"], 42);
        assert_eq!(record["metadata"]["ratio"], 0.5);
    }

    #[test]
    fn test_batch_is_ndjson() {
        let batch = encode_batch(&[event(), event()]);
        let text = String::from_utf8(batch).unwrap();

        let lines: Vec<&str> = text.trim_end().split('\n').collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["severity"], "warning");
        }
    }
}
