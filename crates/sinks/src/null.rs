//! Null sink: counts batches and discards them. Useful for load testing the
//! listeners and the parser without an ingestion backend.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use siphon_pipeline::{EventSink, IngestStatus, SinkError};
use siphon_protocol::LogEvent;

#[derive(Debug, Default)]
pub struct NullSink {
    batches: AtomicU64,
    events: AtomicU64,
}

impl NullSink {
    pub fn new() -> NullSink {
        NullSink::default()
    }

    /// Events discarded so far.
    pub fn events_discarded(&self) -> u64 {
        self.events.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventSink for NullSink {
    async fn ingest(&self, events: Vec<LogEvent>) -> Result<IngestStatus, SinkError> {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.events.fetch_add(events.len() as u64, Ordering::Relaxed);
        Ok(IngestStatus::all(events.len() as u64))
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use siphon_pipeline::EventSink;
    use siphon_protocol::LogEvent;

    use super::NullSink;

    #[tokio::test]
    async fn test_counts_and_discards() {
        let sink = NullSink::new();
        let status = sink
            .ingest(vec![LogEvent::default(), LogEvent::default()])
            .await
            .unwrap();

        assert_eq!(status.ingested, 2);
        assert_eq!(status.failed, 0);
        assert_eq!(sink.events_discarded(), 2);
    }
}
