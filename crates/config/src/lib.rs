//! Siphon Configuration
//!
//! TOML-based configuration loading with sensible defaults. A minimal config
//! should just work - only specify what you need to change.
//!
//! # Example Minimal Config
//!
//! ```toml
//! [listeners]
//! addr_udp = ":5514"
//!
//! [sink]
//! type = "stdout"
//! ```
//!
//! # Example Full Config
//!
//! See `configs/example.toml` for all available options.

mod error;
mod listeners;
mod logging;
mod pipeline;
mod sink;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use listeners::ListenersConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use pipeline::PipelineConfig;
pub use sink::{SinkConfig, SinkType};

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Inbound listeners (TCP, UDP)
    pub listeners: ListenersConfig,

    /// Queue and flush tunables
    pub pipeline: PipelineConfig,

    /// Outbound sink selection
    pub sink: SinkConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_str(&contents)
    }

    /// Validate the configuration
    ///
    /// Checks listener addresses, pipeline thresholds and sink requirements.
    pub fn validate(&self) -> Result<()> {
        self.listeners.validate()?;
        self.pipeline.validate()?;
        self.sink.validate()?;
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }
}

/// Expand a `:port` shorthand into an all-interfaces bind address.
pub fn normalize_addr(addr: &str) -> String {
    if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{normalize_addr, Config, SinkType};

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listeners.addr_tcp, ":601");
        assert_eq!(config.listeners.addr_udp, ":514");
        assert!(config.listeners.tcp_enabled);
        assert!(config.listeners.udp_enabled);
        assert_eq!(config.pipeline.flush_interval_ms, 1000);
        assert_eq!(config.pipeline.flush_threshold, 1024);
        assert_eq!(config.pipeline.drop_threshold, 262_144);
        assert_eq!(config.pipeline.max_queued, 524_288);
        assert_eq!(config.sink.sink_type, SinkType::Stdout);
    }

    #[test]
    fn test_parse_empty() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.listeners.addr_tcp, ":601");
    }

    #[test]
    fn test_parse_partial() {
        let config = Config::from_str(
            r#"
[listeners]
addr_udp = ":5514"

[pipeline]
flush_threshold = 64
"#,
        )
        .unwrap();

        assert_eq!(config.listeners.addr_udp, ":5514");
        assert_eq!(config.listeners.addr_tcp, ":601");
        assert_eq!(config.pipeline.flush_threshold, 64);
        assert_eq!(config.pipeline.flush_interval_ms, 1000);
    }

    #[test]
    fn test_parse_full() {
        let config = Config::from_str(
            r#"
[log]
level = "debug"
format = "json"

[listeners]
addr_tcp = "127.0.0.1:1601"
addr_udp = "127.0.0.1:1514"
tcp_enabled = true
udp_enabled = false
tcp_read_timeout_secs = 30
max_line_size = 4096

[pipeline]
flush_interval_ms = 500
flush_threshold = 2048
max_queued = 100000
drop_threshold = 50000

[sink]
type = "forwarder"
endpoint = "collector.internal:9701"
"#,
        )
        .unwrap();

        assert_eq!(config.log.level.as_str(), "debug");
        assert_eq!(config.listeners.addr_tcp, "127.0.0.1:1601");
        assert!(!config.listeners.udp_enabled);
        assert_eq!(config.listeners.tcp_read_timeout_secs, 30);
        assert_eq!(config.pipeline.flush_interval_ms, 500);
        assert_eq!(config.sink.sink_type, SinkType::Forwarder);
        assert_eq!(config.sink.endpoint.as_deref(), Some("collector.internal:9701"));
    }

    #[test]
    fn test_forwarder_requires_endpoint() {
        let result = Config::from_str("[sink]\ntype = \"forwarder\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_flush_threshold_rejected() {
        let result = Config::from_str("[pipeline]\nflush_threshold = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_listener_addr_rejected() {
        let result = Config::from_str("[listeners]\naddr_tcp = \"\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_addr() {
        assert_eq!(normalize_addr(":601"), "0.0.0.0:601");
        assert_eq!(normalize_addr("127.0.0.1:601"), "127.0.0.1:601");
    }
}
