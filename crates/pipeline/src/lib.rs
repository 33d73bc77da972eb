//! Siphon Pipeline - Bounded queueing, rate monitoring and adaptive flushing
//!
//! # Architecture
//!
//! ```text
//! [Sources] ──parse──> Engine::push ──> [Queue (bounded, mutex)]
//!                          │                     │
//!                          └─ flush signal ──> [Engine::run] ──batch──> EventSink
//!                                                  ▲
//!                              [RateMonitor] ──────┘ (shed when drowning)
//! ```
//!
//! # Key Design
//!
//! - **Bounded queue**: a single mutex guards the buffer and drop count;
//!   pushes beyond the hard cap are dropped with accounting
//! - **Coalesced flush signal**: the push path signals at most one
//!   outstanding out-of-band flush when the queue crosses the threshold
//! - **Process-rate feedback**: queued/processed counters are swapped every
//!   15 s; the published ratio drives probabilistic load shedding
//! - **No lock across the sink**: batches are drained first, the sink is
//!   called without holding the queue mutex

mod engine;
mod monitor;
mod queue;
mod sink;

pub use engine::{Engine, EngineConfig, EngineMetrics, EngineMetricsSnapshot};
pub use monitor::RateMonitor;
pub use queue::Queue;
pub use sink::{EventSink, IngestStatus, SinkError};

use std::time::Duration;

/// Default interval between periodic flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Default queue length that triggers an out-of-band flush.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 1024;

/// Queue length at which the engine starts shedding load.
pub const DEFAULT_DROP_THRESHOLD: usize = 4 * 65536;

/// Default hard cap on queued events.
pub const DEFAULT_MAX_QUEUED: usize = 2 * DEFAULT_DROP_THRESHOLD;

/// Interval between process-rate samples.
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(15);
