//! Siphon Parser - Permissive syslog/JSON log line parsing
//!
//! Turns heterogeneous RFC 3164, RFC 5424, bare-JSON and free-form payloads
//! into normalized [`LogEvent`](siphon_protocol::LogEvent)s.
//!
//! # Strategy
//!
//! ```text
//! line ──> format detection ──> JSON ──(failure)──> syslog (5424 ──> 3164)
//!                                                      │
//!                              synthesized RFC 3164 <──┘ (failure)
//! ```
//!
//! The parser is a pure function over byte slices: no I/O, no shared state.
//! Unparseable input is wrapped in a synthesized RFC 3164 record so that
//! free-form payloads still produce events; input whose sanitized text starts
//! with a NUL byte is dropped as corrupted.
//!
//! # Entry points
//!
//! - [`parse`] - the full facade: parse, normalize, drop empty-text events
//! - [`parse_line_with_fallback`] - same, without the empty-text filter

mod error;
mod json;
mod metadata;
mod parse;
mod strconv;
mod syslog;
mod text;

pub use error::ParseError;
pub use parse::{parse, parse_line_with_fallback};

/// Reserved metadata key set by upstream shippers. Read as a hint by the
/// application post-processing step, never manufactured here.
pub const LOGFILE_KEY: &str = "axiom.logfile";
