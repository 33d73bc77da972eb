//! Bounded event queue with drop accounting.

use parking_lot::Mutex;

use siphon_protocol::LogEvent;

struct Inner {
    buf: Vec<LogEvent>,
    dropped: u64,
}

/// A thread-safe ordered sequence of events.
///
/// `flush_threshold` is the soft batch size returned by [`Queue::get`];
/// `max_items` (when nonzero) is a hard cap beyond which pushes are dropped.
/// A single mutex guards both the buffer and the drop count.
pub struct Queue {
    inner: Mutex<Inner>,
    flush_threshold: usize,
    max_items: usize,
}

impl Queue {
    /// An unbounded queue with the given flush threshold.
    pub fn new(flush_threshold: usize) -> Queue {
        Queue::with_max(flush_threshold, 0)
    }

    /// A queue that holds at most `max_items` events (0 = unbounded).
    pub fn with_max(flush_threshold: usize, max_items: usize) -> Queue {
        Queue {
            inner: Mutex::new(Inner {
                buf: Vec::new(),
                dropped: 0,
            }),
            flush_threshold,
            max_items,
        }
    }

    /// Append events, dropping whatever does not fit under the hard cap.
    /// Returns the queue length after the append and the number dropped.
    pub fn push(&self, mut events: Vec<LogEvent>) -> (usize, usize) {
        let mut inner = self.inner.lock();

        let mut dropped = 0;
        if self.max_items > 0 && inner.buf.len() + events.len() > self.max_items {
            let keep = self.max_items.saturating_sub(inner.buf.len());
            dropped = events.len() - keep;
            events.truncate(keep);
        }
        inner.buf.append(&mut events);
        inner.dropped += dropped as u64;

        (inner.buf.len(), dropped)
    }

    /// Remove and return at most `flush_threshold` events.
    pub fn get(&self) -> Vec<LogEvent> {
        self.get_n(self.flush_threshold)
    }

    /// Remove and return at most `n` events.
    pub fn get_n(&self, n: usize) -> Vec<LogEvent> {
        let mut inner = self.inner.lock();

        if inner.buf.len() <= n {
            // Draining everything: hand the backing store out and start over
            // at threshold capacity. Cheaper than repeatedly shifting.
            std::mem::replace(&mut inner.buf, Vec::with_capacity(self.flush_threshold))
        } else {
            inner.buf.drain(..n).collect()
        }
    }

    /// Current number of queued events.
    pub fn len(&self) -> usize {
        self.inner.lock().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total events dropped at the push boundary since creation.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;
