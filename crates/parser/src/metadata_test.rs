//! Tests for the free-form metadata scanner

use siphon_protocol::{LogEvent, MetaValue};

use super::parse_metadata;

fn scan(text: &[u8]) -> LogEvent {
    let mut event = LogEvent::new();
    parse_metadata(&mut event, text);
    event
}

#[test]
fn test_bare_pairs() {
    let event = scan(b"hello customer=njpatel@gmail.com source=web done");
    assert_eq!(
        event.metadata.get("customer"),
        Some(&MetaValue::Str("njpatel@gmail.com".into()))
    );
    assert_eq!(event.metadata.get("source"), Some(&MetaValue::Str("web".into())));
    assert_eq!(event.metadata.len(), 2);
}

#[test]
fn test_quoted_key_and_value() {
    let event = scan(b"\"customer id\"=\"njpatel@gmail.com\" plan=\"professional plus\"");
    assert_eq!(
        event.metadata.get("customer id"),
        Some(&MetaValue::Str("njpatel@gmail.com".into()))
    );
    assert_eq!(
        event.metadata.get("plan"),
        Some(&MetaValue::Str("professional plus".into()))
    );
}

#[test]
fn test_empty_values_and_keys_ignored() {
    let event = scan(b"foo= =bar = \"region\"=");
    assert!(event.metadata.is_empty());
}

#[test]
fn test_typed_values() {
    let event = scan(b"msg ok bool=false level=info float=5.6 number=3");
    assert_eq!(event.metadata.get("bool"), Some(&MetaValue::Str("false".into())));
    assert_eq!(event.metadata.get("level"), Some(&MetaValue::Str("info".into())));
    assert_eq!(event.metadata.get("float"), Some(&MetaValue::Float(5.6)));
    assert_eq!(event.metadata.get("number"), Some(&MetaValue::Int(3)));
}

#[test]
fn test_timestamp_like_value_stays_string() {
    let event = scan(b"at time=\"2018-06-02T17:16:14.392415523+01:00\" done");
    assert_eq!(
        event.metadata.get("time"),
        Some(&MetaValue::Str("2018-06-02T17:16:14.392415523+01:00".into()))
    );
}

#[test]
fn test_invalid_key_rejected() {
    // Query strings are full of '=' but the surrounding bytes do not form
    // acceptable keys.
    let event = scan(b"GET /api?groups=&last=2018-06-22T15%3A21%3A47 ip=::1");
    assert_eq!(event.metadata.get("ip"), Some(&MetaValue::Str("::1".into())));
    assert!(!event.metadata.contains_key("/api?groups"));
}

#[test]
fn test_later_match_overwrites() {
    let event = scan(b"a key=1 then key=2");
    assert_eq!(event.metadata.get("key"), Some(&MetaValue::Int(2)));
}

#[test]
fn test_equals_near_start_skipped() {
    let event = scan(b"a=b longer=pair");
    assert!(!event.metadata.contains_key("a"));
    assert_eq!(event.metadata.get("longer"), Some(&MetaValue::Str("pair".into())));
}
