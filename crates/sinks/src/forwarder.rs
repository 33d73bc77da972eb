//! Forwarder sink: NDJSON batches over a plain TCP connection.
//!
//! Connects lazily and reconnects after a failed write; the batch that hit
//! the error is reported failed (the engine counts it), not retried. There
//! is no TLS and no authentication here - anything needing those belongs in
//! a dedicated sink adapter.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use siphon_pipeline::{EventSink, IngestStatus, SinkError};
use siphon_protocol::LogEvent;

use crate::encode::encode_batch;

/// Forwarder sink configuration
#[derive(Debug, Clone)]
pub struct ForwarderSinkConfig {
    /// Endpoint to forward to, e.g. "collector.internal:9701"
    pub endpoint: String,
}

/// NDJSON-over-TCP forwarder.
pub struct ForwarderSink {
    config: ForwarderSinkConfig,
    conn: Mutex<Option<TcpStream>>,
}

impl ForwarderSink {
    pub fn new(config: ForwarderSinkConfig) -> ForwarderSink {
        ForwarderSink {
            config,
            conn: Mutex::new(None),
        }
    }

    async fn write_batch(&self, buf: &[u8]) -> Result<(), SinkError> {
        let mut guard = self.conn.lock().await;

        if guard.is_none() {
            let stream = TcpStream::connect(&self.config.endpoint)
                .await
                .map_err(|err| {
                    SinkError::connection(format!("{}: {err}", self.config.endpoint))
                })?;
            tracing::info!(endpoint = %self.config.endpoint, "forwarder connected");
            *guard = Some(stream);
        }

        let stream = guard
            .as_mut()
            .ok_or_else(|| SinkError::connection("no connection"))?;

        let result = async {
            stream.write_all(buf).await?;
            stream.flush().await
        }
        .await;

        if let Err(err) = result {
            // Drop the broken connection; the next batch reconnects.
            *guard = None;
            return Err(SinkError::Io(err));
        }

        Ok(())
    }
}

#[async_trait]
impl EventSink for ForwarderSink {
    async fn ingest(&self, events: Vec<LogEvent>) -> Result<IngestStatus, SinkError> {
        let buf = encode_batch(&events);
        self.write_batch(&buf).await?;
        Ok(IngestStatus::all(events.len() as u64))
    }

    fn name(&self) -> &'static str {
        "forwarder"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use siphon_pipeline::EventSink;
    use siphon_protocol::{LogEvent, Severity};

    use super::{ForwarderSink, ForwarderSinkConfig};

    fn event(text: &str) -> LogEvent {
        LogEvent {
            remote_addr: "10.0.0.1".into(),
            timestamp: 1,
            severity: Severity::Info,
            hostname: "h".into(),
            application: "a".into(),
            text: text.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_forwards_ndjson_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            // Read until the client goes away or a short idle window passes.
            let _ = tokio::time::timeout(
                Duration::from_millis(500),
                stream.read_to_end(&mut received),
            )
            .await;
            received
        });

        let sink = Arc::new(ForwarderSink::new(ForwarderSinkConfig { endpoint }));
        let status = sink
            .ingest(vec![event("first"), event("second")])
            .await
            .unwrap();
        assert_eq!(status.ingested, 2);

        // Close the connection so the server's read completes.
        sink.conn.lock().await.take();

        let received = server.await.unwrap();
        let text = String::from_utf8(received).unwrap();
        let lines: Vec<&str> = text.trim_end().split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"first\""));
        assert!(lines[1].contains("\"second\""));
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        // A port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        drop(listener);

        let sink = ForwarderSink::new(ForwarderSinkConfig { endpoint });
        let result = sink.ingest(vec![event("lost")]).await;
        assert!(result.is_err());
    }
}
