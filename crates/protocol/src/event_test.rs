//! Tests for the event model

use crate::{LogEvent, MetaValue, Severity};

fn sample() -> LogEvent {
    LogEvent {
        remote_addr: "10.0.0.1".into(),
        timestamp: 1_000,
        severity: Severity::Info,
        hostname: "host-a".into(),
        application: "app-a".into(),
        text: "hello".into(),
        metadata: [("k".to_string(), MetaValue::Str("v".into()))]
            .into_iter()
            .collect(),
    }
}

#[test]
fn test_merge_overwrites_non_empty_fields() {
    let mut event = sample();
    let other = LogEvent {
        timestamp: 2_000,
        severity: Severity::Debug,
        hostname: "host-b".into(),
        text: "bye".into(),
        ..Default::default()
    };

    event.merge(other);

    assert_eq!(event.timestamp, 2_000);
    assert_eq!(event.severity, Severity::Debug);
    assert_eq!(event.hostname, "host-b");
    assert_eq!(event.text, "bye");
    // Untouched fields survive
    assert_eq!(event.application, "app-a");
    assert_eq!(event.remote_addr, "10.0.0.1");
}

#[test]
fn test_merge_skips_empty_fields() {
    let mut event = sample();
    event.merge(LogEvent::default());

    assert_eq!(event, sample());
}

#[test]
fn test_merge_unions_metadata_later_wins() {
    let mut event = sample();
    let other = LogEvent {
        metadata: [
            ("k".to_string(), MetaValue::Int(7)),
            ("extra".to_string(), MetaValue::Float(1.5)),
        ]
        .into_iter()
        .collect(),
        ..Default::default()
    };

    event.merge(other);

    assert_eq!(event.metadata.get("k"), Some(&MetaValue::Int(7)));
    assert_eq!(event.metadata.get("extra"), Some(&MetaValue::Float(1.5)));
}

#[test]
fn test_merge_unknown_severity_does_not_overwrite() {
    let mut event = sample();
    let other = LogEvent {
        severity: Severity::Unknown,
        ..Default::default()
    };
    event.merge(other);
    assert_eq!(event.severity, Severity::Info);
}

#[test]
fn test_meta_value_serialization() {
    assert_eq!(
        serde_json::to_string(&MetaValue::Str("x".into())).unwrap(),
        "\"x\""
    );
    assert_eq!(serde_json::to_string(&MetaValue::Int(3)).unwrap(), "3");
    assert_eq!(serde_json::to_string(&MetaValue::Float(4.5)).unwrap(), "4.5");
}

#[test]
fn test_severity_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
}
