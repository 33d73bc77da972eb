//! Syslog UDP source
//!
//! A single receive loop over one socket: one datagram is one record (up to
//! the jumbo packet size), delivered with the sender's IP. Datagram loss is
//! accepted; empty packets are counted and dropped.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::common::SourceMetrics;
use crate::tcp::trim_trailing_newline;
use crate::LineHandler;

// =============================================================================
// Constants
// =============================================================================

/// Receive buffer per datagram: jumbo frame payload.
pub const JUMBO_PACKET_SIZE: usize = 8960;

/// Default socket buffer size (64KB before the multiplier)
const DEFAULT_SOCKET_BUFFER_SIZE: usize = 64 * 1024;

/// SO_RCVBUF multiplier: UDP bursts arrive faster than we drain.
const RECV_BUFFER_MULTIPLIER: usize = 4;

// =============================================================================
// Configuration
// =============================================================================

/// Syslog UDP source configuration
#[derive(Debug, Clone)]
pub struct UdpSourceConfig {
    /// Bind address, e.g. "0.0.0.0:514"
    pub addr: String,

    /// Socket buffer size (multiplied for SO_RCVBUF)
    pub socket_buffer_size: usize,
}

impl Default for UdpSourceConfig {
    fn default() -> Self {
        UdpSourceConfig {
            addr: "0.0.0.0:514".into(),
            socket_buffer_size: DEFAULT_SOCKET_BUFFER_SIZE,
        }
    }
}

impl UdpSourceConfig {
    /// Create config with a custom bind address
    pub fn with_addr(addr: impl Into<String>) -> Self {
        UdpSourceConfig {
            addr: addr.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Syslog UDP source metrics
#[derive(Debug, Default)]
pub struct UdpSourceMetrics {
    /// Base source metrics
    pub base: SourceMetrics,

    /// Packets received
    pub packets_received: AtomicU64,

    /// Empty packets dropped
    pub packets_empty: AtomicU64,
}

impl UdpSourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        UdpSourceMetrics {
            base: SourceMetrics::new(),
            packets_received: AtomicU64::new(0),
            packets_empty: AtomicU64::new(0),
        }
    }

    /// Record a received packet
    #[inline]
    pub fn packet_received(&self, bytes: u64) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.base.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an empty packet
    #[inline]
    pub fn packet_empty(&self) {
        self.packets_empty.fetch_add(1, Ordering::Relaxed);
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Syslog UDP source errors
#[derive(Debug, thiserror::Error)]
pub enum UdpSourceError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid bind address
    #[error("invalid bind address: {0}")]
    Addr(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Source Implementation
// =============================================================================

/// Syslog UDP source
pub struct UdpSource {
    config: UdpSourceConfig,
    handler: Arc<dyn LineHandler>,
    metrics: Arc<UdpSourceMetrics>,
    running: Arc<AtomicBool>,
}

impl UdpSource {
    /// Create a new UDP source
    pub fn new(config: UdpSourceConfig, handler: Arc<dyn LineHandler>) -> Self {
        UdpSource {
            config,
            handler,
            metrics: Arc::new(UdpSourceMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<UdpSourceMetrics> {
        &self.metrics
    }

    /// Check if source is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the source
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Run the source (main entry point)
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), UdpSourceError> {
        let socket_addr: SocketAddr = self
            .config
            .addr
            .parse()
            .map_err(|_| UdpSourceError::Addr(self.config.addr.clone()))?;

        let socket = self
            .create_socket(socket_addr)
            .map_err(|source| UdpSourceError::Bind {
                address: self.config.addr.clone(),
                source,
            })?;

        self.running.store(true, Ordering::Relaxed);

        tracing::info!(
            addr = %self.config.addr,
            packet_size = JUMBO_PACKET_SIZE,
            "syslog UDP source listening"
        );

        let mut recv_buf = vec![0u8; JUMBO_PACKET_SIZE];

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.running.store(false, Ordering::Relaxed);
                    break;
                }

                recv_result = socket.recv_from(&mut recv_buf) => {
                    match recv_result {
                        Ok((len, peer_addr)) => {
                            self.process_packet(&recv_buf[..len], peer_addr);
                        }
                        Err(err) => {
                            if self.running.load(Ordering::Relaxed) {
                                self.metrics.base.error();
                                tracing::debug!(error = %err, "syslog UDP recv error");
                            }
                        }
                    }
                }
            }
        }

        tracing::info!(addr = %self.config.addr, "syslog UDP source stopped");

        Ok(())
    }

    fn process_packet(&self, data: &[u8], peer_addr: SocketAddr) {
        let line = trim_trailing_newline(data);
        if line.is_empty() {
            self.metrics.packet_empty();
            tracing::debug!(peer = %peer_addr, "empty UDP packet dropped");
            return;
        }

        self.metrics.packet_received(data.len() as u64);
        self.metrics
            .base
            .lines_delivered
            .fetch_add(1, Ordering::Relaxed);

        let remote_ip = peer_addr.ip().to_string();
        self.handler.handle_line(line, &remote_ip);
    }

    /// Create the UDP socket with a sized receive buffer.
    fn create_socket(&self, addr: SocketAddr) -> std::io::Result<UdpSocket> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;

        let recv_buffer_size = self.config.socket_buffer_size * RECV_BUFFER_MULTIPLIER;
        if let Err(err) = socket.set_recv_buffer_size(recv_buffer_size) {
            tracing::warn!(
                error = %err,
                requested_size = recv_buffer_size,
                "failed to set UDP SO_RCVBUF"
            );
        }

        socket.bind(&addr.into())?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        UdpSocket::from_std(std_socket)
    }
}

#[cfg(test)]
#[path = "udp_test.rs"]
mod udp_test;
