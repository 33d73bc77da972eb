//! The normalized log event and its metadata values.

use std::collections::HashMap;

use serde::Serialize;

use crate::Severity;

/// A single metadata value extracted by the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Str(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Str(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Int(n)
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        MetaValue::Float(f)
    }
}

/// Metadata attached to an event. Keys are unique; insertion order is not
/// significant.
pub type Metadata = HashMap<String, MetaValue>;

/// The normalized output of the parser.
///
/// Emitted events satisfy: `timestamp != 0` (wall clock when unresolved),
/// `hostname != ""` (remote address when absent), `text != ""` (empty-text
/// events are dropped), and a severity in the `Error`..=`Trace` range after
/// normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Source IP, never including the port.
    pub remote_addr: String,

    /// Nanoseconds since the Unix epoch. Zero means "unresolved".
    pub timestamp: i64,

    /// Severity after `pri mod 8` or key lookup; `Unknown` until normalized.
    pub severity: Severity,

    /// May be empty until post-fill replaces it with `remote_addr`.
    pub hostname: String,

    /// Application (tag) name, stripped of any `[pid]` suffix. May be empty.
    pub application: String,

    /// The free-form message body.
    pub text: String,

    /// Key/value metadata from structured data, text scanning or JSON
    /// flattening.
    pub metadata: Metadata,
}

impl Default for LogEvent {
    fn default() -> Self {
        LogEvent {
            remote_addr: String::new(),
            timestamp: 0,
            severity: Severity::Unknown,
            hostname: String::new(),
            application: String::new(),
            text: String::new(),
            metadata: Metadata::new(),
        }
    }
}

impl LogEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `other` into `self`: non-empty fields overwrite, metadata is
    /// unioned with later keys winning.
    pub fn merge(&mut self, other: LogEvent) {
        if other.timestamp != 0 && other.timestamp != self.timestamp {
            self.timestamp = other.timestamp;
        }
        if other.severity != Severity::Unknown && other.severity != self.severity {
            self.severity = other.severity;
        }
        if !other.remote_addr.is_empty() {
            self.remote_addr = other.remote_addr;
        }
        if !other.hostname.is_empty() {
            self.hostname = other.hostname;
        }
        if !other.application.is_empty() {
            self.application = other.application;
        }
        if !other.text.is_empty() {
            self.text = other.text;
        }
        self.metadata.extend(other.metadata);
    }
}
