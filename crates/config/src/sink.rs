//! Outbound sink selection.

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Which sink adapter to wire behind the flush engine.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    /// NDJSON to standard output (default)
    #[default]
    Stdout,
    /// Count and discard
    Null,
    /// NDJSON over a plain TCP connection
    Forwarder,
}

/// Sink configuration
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "forwarder"
/// endpoint = "collector.internal:9701"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Sink adapter type
    #[serde(rename = "type")]
    pub sink_type: SinkType,

    /// Endpoint for the forwarder sink
    pub endpoint: Option<String>,
}

impl SinkConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.sink_type == SinkType::Forwarder
            && self.endpoint.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConfigError::validation(
                "sink.endpoint is required for the forwarder sink",
            ));
        }
        Ok(())
    }
}
