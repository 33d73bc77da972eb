//! JSON record parsing and metadata flattening.
//!
//! A JSON object is mapped onto an event by matching top-level keys
//! case-insensitively against well-known timestamp/hostname/application/
//! message/severity keys; everything else is flattened into metadata with
//! dot-joined paths and `[index]` array suffixes.

use chrono::DateTime;
use serde_json::Value;

use siphon_protocol::{LogEvent, MetaValue, Severity};

use crate::error::ParseError;

/// Values nested deeper than this are silently dropped.
const MAX_NEST_LEVEL: i64 = 5;

const TIMESTAMP_KEYS: [&str; 7] = [
    "syslog.timestamp",
    "timestamp",
    "eventtime",
    "@timestamp",
    "_timestamp",
    "date",
    "published_date",
];
const HOST_KEYS: [&str; 3] = ["syslog.hostname", "hostname", "host"];
const APP_KEYS: [&str; 3] = ["syslog.appname", "app", "application"];
const MSG_KEYS: [&str; 2] = ["message", "msg"];
const SEVERITY_KEYS: [&str; 4] = ["syslog.severity", "severity", "status", "level"];

/// Parse a single JSON object into an event.
pub(crate) fn parse_json(data: &[u8]) -> Result<LogEvent, ParseError> {
    let value: Value = serde_json::from_slice(data).map_err(|_| ParseError::Parse)?;
    let Value::Object(map) = value else {
        return Err(ParseError::Parse);
    };

    let mut event = LogEvent::new();
    for (key, value) in map {
        extract_property(&mut event, &key, value);
    }
    Ok(event)
}

/// Route one top-level property: well-known keys fill event fields (only
/// when the value is a string), everything else flattens into metadata.
fn extract_property(event: &mut LogEvent, key: &str, value: Value) {
    let lowered = key.to_ascii_lowercase();
    let lowered = lowered.as_str();

    if let Value::String(s) = &value {
        if TIMESTAMP_KEYS.contains(&lowered) {
            match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => event.timestamp = ts.timestamp_nanos_opt().unwrap_or(0),
                Err(_) => {
                    event
                        .metadata
                        .insert("unparsed_timestamp".to_string(), MetaValue::Str(s.clone()));
                }
            }
            return;
        }
        if HOST_KEYS.contains(&lowered) {
            event.hostname = s.clone();
            return;
        }
        if APP_KEYS.contains(&lowered) {
            event.application = s.clone();
            return;
        }
        if MSG_KEYS.contains(&lowered) {
            event.text = s.clone();
            return;
        }
        if SEVERITY_KEYS.contains(&lowered) {
            event.severity = Severity::from_name(s);
            return;
        }
    }

    extract_metadata_value(event, join_key("", key), value, 0);
}

/// Flatten one value into metadata under `concat_key`.
fn extract_metadata_value(event: &mut LogEvent, concat_key: String, value: Value, level: i64) {
    if level > MAX_NEST_LEVEL {
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, value) in map {
                extract_metadata_value(event, join_key(&concat_key, &key), value, level + 1);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.into_iter().enumerate() {
                extract_metadata_value(
                    event,
                    format!("{concat_key}[{index}]"),
                    value,
                    level + 1,
                );
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                event.metadata.insert(concat_key, MetaValue::Int(i));
            } else if let Some(f) = n.as_f64() {
                event.metadata.insert(concat_key, MetaValue::Float(f));
            }
        }
        Value::Bool(b) => {
            event
                .metadata
                .insert(concat_key, MetaValue::Str(b.to_string()));
        }
        Value::String(s) => {
            event.metadata.insert(concat_key, MetaValue::Str(s));
        }
        Value::Null => {
            tracing::debug!(key = %concat_key, "null JSON value ignored");
        }
    }
}

/// Join a key segment onto a parent path. Segments containing `.`, `[` or
/// `]` are wrapped in double quotes so the path stays unambiguous.
fn join_key(parent: &str, child: &str) -> String {
    let child = if child.contains(['.', '[', ']']) {
        format!("\"{child}\"")
    } else {
        child.to_string()
    };
    if parent.is_empty() {
        child
    } else {
        format!("{parent}.{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::join_key;

    #[test]
    fn test_join_key_plain() {
        assert_eq!(join_key("", "artist"), "artist");
        assert_eq!(join_key("forwind", "album"), "forwind.album");
    }

    #[test]
    fn test_join_key_quotes_special_segments() {
        assert_eq!(join_key("", "oh.no"), "\"oh.no\"");
        assert_eq!(join_key("oh", "no[7]"), "oh.\"no[7]\"");
        assert_eq!(join_key("\"a.h[a]\"", "float"), "\"a.h[a]\".float");
    }
}
