//! Common types for sources.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by all source types
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Currently active connections
    pub connections_active: AtomicU64,

    /// Total connections accepted
    pub connections_total: AtomicU64,

    /// Total lines delivered to the handler
    pub lines_delivered: AtomicU64,

    /// Total bytes received
    pub bytes_received: AtomicU64,

    /// Total errors encountered
    pub errors: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        SourceMetrics {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            lines_delivered: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Increment active connections
    #[inline]
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement active connections
    #[inline]
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a delivered line
    #[inline]
    pub fn line_delivered(&self, bytes: u64) {
        self.lines_delivered.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an error
    #[inline]
    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}
