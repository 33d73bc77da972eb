//! Siphon Sinks - Ingestion sink adapters
//!
//! Implementations of the pipeline's [`EventSink`](siphon_pipeline::EventSink)
//! seam plus the outbound record encoding they share.
//!
//! # Available Sinks
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `stdout` | NDJSON to standard output (default) |
//! | `null` | Count and discard (load testing) |
//! | `forwarder` | NDJSON over a plain TCP connection |
//!
//! The real ingestion backend (an HTTP client with credentials) lives
//! outside this crate; anything that implements `EventSink` can be wired
//! into the engine.

mod encode;

/// Forwarder sink - NDJSON over TCP
pub mod forwarder;

/// Null sink - discards all data
pub mod null;

/// Stdout sink - NDJSON to standard output
pub mod stdout;

pub use encode::{encode_batch, encode_record};
pub use forwarder::{ForwarderSink, ForwarderSinkConfig};
pub use null::NullSink;
pub use stdout::StdoutSink;
