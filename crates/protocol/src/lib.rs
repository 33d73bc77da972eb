//! Siphon Protocol - Core types for the syslog ingestion pipeline
//!
//! This crate provides the types that flow through the pipeline:
//! - `LogEvent` - The normalized output of the parser
//! - `Severity` - Syslog severity levels plus the internal `Unknown` sentinel
//! - `MetaValue` - Typed metadata values (string, integer, float)
//!
//! Events are created by the parser, held by value in the queue, forwarded in
//! batches by the flush engine, then released. They are never mutated after
//! leaving the parser.

mod event;
mod severity;

pub use event::{LogEvent, MetaValue, Metadata};
pub use severity::Severity;

use chrono::Utc;

/// Current wall clock as nanoseconds since the Unix epoch.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(0)
}

// Test modules - only compiled during testing
#[cfg(test)]
mod event_test;
