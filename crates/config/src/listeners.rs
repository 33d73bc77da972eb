//! Inbound listener configuration.

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Default TCP listen address (RFC 6587 syslog over TCP)
const DEFAULT_ADDR_TCP: &str = ":601";

/// Default UDP listen address (classic syslog)
const DEFAULT_ADDR_UDP: &str = ":514";

/// Default per-read deadline on TCP connections
const DEFAULT_TCP_READ_TIMEOUT_SECS: u64 = 60;

/// Default maximum accepted line size
const DEFAULT_MAX_LINE_SIZE: usize = 8192;

/// Listener configuration
///
/// Addresses accept the `:port` shorthand for all interfaces.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenersConfig {
    /// TCP listen address
    pub addr_tcp: String,

    /// UDP listen address
    pub addr_udp: String,

    /// Whether the TCP listener is enabled
    pub tcp_enabled: bool,

    /// Whether the UDP listener is enabled
    pub udp_enabled: bool,

    /// Maximum time between reads on a TCP connection (0 disables)
    pub tcp_read_timeout_secs: u64,

    /// Maximum accepted line size on TCP
    pub max_line_size: usize,
}

impl Default for ListenersConfig {
    fn default() -> Self {
        ListenersConfig {
            addr_tcp: DEFAULT_ADDR_TCP.into(),
            addr_udp: DEFAULT_ADDR_UDP.into(),
            tcp_enabled: true,
            udp_enabled: true,
            tcp_read_timeout_secs: DEFAULT_TCP_READ_TIMEOUT_SECS,
            max_line_size: DEFAULT_MAX_LINE_SIZE,
        }
    }
}

impl ListenersConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.tcp_enabled && self.addr_tcp.is_empty() {
            return Err(ConfigError::validation("listeners.addr_tcp must not be empty"));
        }
        if self.udp_enabled && self.addr_udp.is_empty() {
            return Err(ConfigError::validation("listeners.addr_udp must not be empty"));
        }
        if self.max_line_size == 0 {
            return Err(ConfigError::validation("listeners.max_line_size must be nonzero"));
        }
        Ok(())
    }
}
