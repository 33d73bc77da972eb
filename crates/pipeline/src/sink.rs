//! The ingestion sink seam.
//!
//! The flush engine hands drained batches to an [`EventSink`]; everything
//! behind the trait (encoding, transport, credentials) is a sink adapter
//! concern.

use async_trait::async_trait;
use thiserror::Error;

use siphon_protocol::LogEvent;

/// Outcome of one batch hand-off.
#[derive(Debug, Clone, Default)]
pub struct IngestStatus {
    /// Events accepted by the sink.
    pub ingested: u64,

    /// Events the sink rejected.
    pub failed: u64,

    /// One message per failure bucket.
    pub failures: Vec<String>,
}

impl IngestStatus {
    /// A fully successful batch.
    pub fn all(count: u64) -> IngestStatus {
        IngestStatus {
            ingested: count,
            ..Default::default()
        }
    }
}

/// Common sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink initialization failed
    #[error("failed to initialize sink: {0}")]
    Init(String),

    /// Failed to write a batch
    #[error("write failed: {0}")]
    Write(String),

    /// Connection error (for network sinks)
    #[error("connection error: {0}")]
    Connection(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SinkError {
    pub fn init(msg: impl Into<String>) -> SinkError {
        SinkError::Init(msg.into())
    }

    pub fn write(msg: impl Into<String>) -> SinkError {
        SinkError::Write(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> SinkError {
        SinkError::Connection(msg.into())
    }
}

/// Destination for flushed batches.
///
/// Implementations must not assume batch sizes or call frequency; the engine
/// may deliver a single event or a full threshold batch. Errors are logged
/// and counted by the engine, never fatal to the flush loop.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Hand one batch to the sink.
    async fn ingest(&self, events: Vec<LogEvent>) -> Result<IngestStatus, SinkError>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}
