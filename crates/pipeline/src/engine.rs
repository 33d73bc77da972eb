//! The flush engine.
//!
//! Owns the queue and the rate monitor, and runs the flush loop with three
//! wakeups: the periodic tick, the coalesced out-of-band signal from the
//! push path, and shutdown (one final flush, then done).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use siphon_protocol::LogEvent;

use crate::monitor::RateMonitor;
use crate::queue::Queue;
use crate::sink::EventSink;
use crate::{
    DEFAULT_DROP_THRESHOLD, DEFAULT_FLUSH_INTERVAL, DEFAULT_FLUSH_THRESHOLD, DEFAULT_MAX_QUEUED,
    MONITOR_INTERVAL,
};

/// Exponent applied to the shed probability so an overloaded queue has a
/// chance to actually clear.
const SHED_EXPONENT: f64 = 0.85;

/// Flush engine configuration. Captured once at startup; the engine never
/// re-reads tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between periodic flushes.
    pub flush_interval: Duration,

    /// Queue length that triggers an out-of-band flush, and the batch size
    /// drained per flush.
    pub flush_threshold: usize,

    /// Hard cap on queued events (0 = unbounded).
    pub max_queued: usize,

    /// Queue length at which shedding kicks in.
    pub drop_threshold: usize,

    /// Interval between process-rate samples.
    pub monitor_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            max_queued: DEFAULT_MAX_QUEUED,
            drop_threshold: DEFAULT_DROP_THRESHOLD,
            monitor_interval: MONITOR_INTERVAL,
        }
    }
}

/// Flush engine metrics
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Events accepted by the push path
    pub events_pushed: AtomicU64,

    /// Events the sink accepted
    pub events_ingested: AtomicU64,

    /// Events dropped anywhere (queue overflow, shedding, sink rejects)
    pub events_dropped: AtomicU64,

    /// Batches handed to the sink
    pub batches_flushed: AtomicU64,

    /// Sink hand-offs that failed outright
    pub sink_errors: AtomicU64,
}

impl EngineMetrics {
    pub const fn new() -> EngineMetrics {
        EngineMetrics {
            events_pushed: AtomicU64::new(0),
            events_ingested: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
        }
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            events_pushed: self.events_pushed.load(Ordering::Relaxed),
            events_ingested: self.events_ingested.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of engine metrics
#[derive(Debug, Clone, Copy)]
pub struct EngineMetricsSnapshot {
    pub events_pushed: u64,
    pub events_ingested: u64,
    pub events_dropped: u64,
    pub batches_flushed: u64,
    pub sink_errors: u64,
}

/// Queue + monitor + flush loop.
pub struct Engine {
    config: EngineConfig,
    queue: Queue,
    monitor: RateMonitor,
    sink: Arc<dyn EventSink>,
    metrics: Arc<EngineMetrics>,
    flush_tx: mpsc::Sender<()>,
    flush_rx: tokio::sync::Mutex<mpsc::Receiver<()>>,
}

impl Engine {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Engine {
        // Capacity 1: the push path signals at most one outstanding flush.
        let (flush_tx, flush_rx) = mpsc::channel(1);

        Engine {
            queue: Queue::with_max(config.flush_threshold, config.max_queued),
            monitor: RateMonitor::new(),
            sink,
            metrics: Arc::new(EngineMetrics::new()),
            flush_tx,
            flush_rx: tokio::sync::Mutex::new(flush_rx),
            config,
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Current queue length.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queue one event, signaling an out-of-band flush when the queue
    /// crosses the threshold.
    pub fn push(&self, event: LogEvent) {
        let (len, dropped) = self.queue.push(vec![event]);

        if len >= self.config.flush_threshold {
            // Coalesced: a full channel means a flush is already pending.
            let _ = self.flush_tx.try_send(());
        }

        self.metrics.events_pushed.fetch_add(1, Ordering::Relaxed);
        if dropped > 0 {
            self.metrics
                .events_dropped
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }

        self.monitor.add_queued(1);
    }

    /// Run the flush loop until cancelled; performs one final flush on the
    /// way out.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut flush_rx = self.flush_rx.lock().await;

        let mut flush_tick = interval_at(
            Instant::now() + self.config.flush_interval,
            self.config.flush_interval,
        );
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut monitor_tick = interval_at(
            Instant::now() + self.config.monitor_interval,
            self.config.monitor_interval,
        );
        monitor_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            flush_interval_ms = self.config.flush_interval.as_millis() as u64,
            flush_threshold = self.config.flush_threshold,
            max_queued = self.config.max_queued,
            "flush engine running"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                _ = flush_tick.tick() => {
                    self.flush().await;
                }

                _ = monitor_tick.tick() => {
                    self.monitor.swap_and_publish();
                }

                signal = flush_rx.recv() => {
                    match signal {
                        Some(()) => self.flush().await,
                        None => break,
                    }
                }
            }
        }

        // Final flush so shutdown never strands queued events.
        self.flush().await;

        tracing::info!("flush engine stopped");
    }

    /// Drain one batch, shed if the queue is drowning, hand the rest to the
    /// sink. No lock is held across the sink call.
    pub async fn flush(&self) {
        let mut events = self.queue.get();
        if events.is_empty() {
            return;
        }

        let queue_len = self.queue.len();
        if queue_len >= self.config.drop_threshold {
            let rate = self.monitor.rate();
            if rate > 1.0 {
                let dropped = shed_events(&mut events, queue_len, rate);
                if dropped > 0 {
                    self.metrics
                        .events_dropped
                        .fetch_add(dropped as u64, Ordering::Relaxed);
                    // Shed events count as processed: they left the queue.
                    self.monitor.add_processed(dropped as u64);
                    tracing::warn!(
                        dropped,
                        rate,
                        queue_len,
                        "shedding queued events"
                    );
                }
            } else if rate == 0.0 {
                // Nothing is draining; drop this entire batch and grab a
                // fresh one. These do NOT count as processed.
                let dropped = events.len();
                self.metrics
                    .events_dropped
                    .fetch_add(dropped as u64, Ordering::Relaxed);
                tracing::warn!(dropped, queue_len, "nothing draining, dropping whole batch");

                events = self.queue.get();
                if events.is_empty() {
                    return;
                }
            }
        }

        let batch_len = events.len() as u64;
        match self.sink.ingest(events).await {
            Ok(status) => {
                self.metrics.batches_flushed.fetch_add(1, Ordering::Relaxed);
                self.metrics
                    .events_ingested
                    .fetch_add(status.ingested, Ordering::Relaxed);
                self.monitor.add_processed(batch_len);

                if status.failed > 0 {
                    self.metrics
                        .events_dropped
                        .fetch_add(status.failed, Ordering::Relaxed);
                    for failure in &status.failures {
                        tracing::warn!(
                            sink = self.sink.name(),
                            failed = status.failed,
                            batch = batch_len,
                            error = %failure,
                            "sink dropped events"
                        );
                    }
                }
            }
            Err(err) => {
                self.metrics.sink_errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!(sink = self.sink.name(), error = %err, "sink ingest failed");
            }
        }
    }
}

/// Drop events in place with probability `(1 - 1/rate)^0.85`, preserving
/// order. The PRNG is seeded from the queue length, so a given backlog sheds
/// deterministically.
fn shed_events(events: &mut Vec<LogEvent>, queue_len: usize, rate: f64) -> usize {
    // rate = 1.0 -> drop 0%, rate = 2.0 -> drop 50%, rate = 4.0 -> drop 75%
    let drop_rate = (1.0 - 1.0 / rate).powf(SHED_EXPONENT);

    let mut rng = SmallRng::seed_from_u64(queue_len as u64);
    let before = events.len();
    events.retain(|_| rng.gen::<f64>() >= drop_rate);

    before - events.len()
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
