//! Stdout sink: NDJSON records to standard output.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use siphon_pipeline::{EventSink, IngestStatus, SinkError};
use siphon_protocol::LogEvent;

use crate::encode::encode_batch;

/// Writes one JSON record per line to stdout, flushing per batch.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> StdoutSink {
        StdoutSink
    }
}

#[async_trait]
impl EventSink for StdoutSink {
    async fn ingest(&self, events: Vec<LogEvent>) -> Result<IngestStatus, SinkError> {
        let buf = encode_batch(&events);

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&buf).await?;
        stdout.flush().await?;

        Ok(IngestStatus::all(events.len() as u64))
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
