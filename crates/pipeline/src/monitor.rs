//! Process-rate monitoring.
//!
//! Two atomic counters track how many events entered the queue and how many
//! were handed to the sink. Every sampling interval both are swapped to zero
//! and their ratio is published; the flush engine reads it to decide whether
//! to shed load.

use std::sync::atomic::{AtomicU64, Ordering};

/// Queued-vs-processed ratio monitor.
///
/// The published rate is stored as raw `f64` bits in an `AtomicU64` so the
/// flush engine always reads a consistent double.
pub struct RateMonitor {
    queued: AtomicU64,
    processed: AtomicU64,
    rate_bits: AtomicU64,
}

impl RateMonitor {
    pub const fn new() -> RateMonitor {
        RateMonitor {
            queued: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            rate_bits: AtomicU64::new(0),
        }
    }

    /// Record events entering the queue.
    #[inline]
    pub fn add_queued(&self, n: u64) {
        self.queued.fetch_add(n, Ordering::Relaxed);
    }

    /// Record events leaving the queue (ingested or shed).
    #[inline]
    pub fn add_processed(&self, n: u64) {
        self.processed.fetch_add(n, Ordering::Relaxed);
    }

    /// Swap both counters to zero and publish the ratio of the snapshot:
    /// nothing queued → 1.0, nothing processed → 0.0, otherwise
    /// queued/processed.
    pub fn swap_and_publish(&self) {
        let queued = self.queued.swap(0, Ordering::AcqRel);
        let processed = self.processed.swap(0, Ordering::AcqRel);

        let rate = if queued == 0 {
            1.0
        } else if processed == 0 {
            0.0
        } else {
            queued as f64 / processed as f64
        };

        self.rate_bits.store(rate.to_bits(), Ordering::Release);
    }

    /// The last published queued-vs-processed ratio. Values above 1.0 mean
    /// events are arriving faster than they drain; 0.0 means nothing drained
    /// at all while events were queued.
    pub fn rate(&self) -> f64 {
        f64::from_bits(self.rate_bits.load(Ordering::Acquire))
    }
}

impl Default for RateMonitor {
    fn default() -> Self {
        RateMonitor::new()
    }
}

#[cfg(test)]
#[path = "monitor_test.rs"]
mod monitor_test;
