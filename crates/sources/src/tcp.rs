//! Syslog TCP source
//!
//! Accepts connections and reads newline-delimited frames (LF or CRLF),
//! delivering each line with the peer IP to the shared handler.
//!
//! # Framing
//!
//! Non-transparent framing: one message per line. Reads are bounded by a
//! per-read deadline that is refreshed on every successful read, and by a
//! maximum line size; oversized lines are consumed and dropped so the stream
//! stays aligned.

use std::io;
use std::net::SocketAddr;
#[cfg(unix)]
use std::os::fd::{AsRawFd, FromRawFd};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[cfg(unix)]
use socket2::{Socket, TcpKeepalive};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::common::SourceMetrics;
use crate::LineHandler;

// =============================================================================
// Constants
// =============================================================================

/// Default maximum time between reads on a connection.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Default maximum line size (8KB)
const DEFAULT_MAX_LINE_SIZE: usize = 8192;

/// Default read buffer size per connection (64KB)
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default socket buffer size for SO_RCVBUF/SO_SNDBUF (256KB)
const DEFAULT_SOCKET_BUFFER_SIZE: usize = 256 * 1024;

/// Keepalive probe interval
#[cfg(unix)]
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

// =============================================================================
// Configuration
// =============================================================================

/// Syslog TCP source configuration
#[derive(Debug, Clone)]
pub struct TcpSourceConfig {
    /// Bind address, e.g. "0.0.0.0:601"
    pub addr: String,

    /// Per-read deadline (zero disables it)
    pub read_timeout: Duration,

    /// Maximum accepted line size
    pub max_line_size: usize,

    /// Read buffer size per connection
    pub buffer_size: usize,

    /// TCP nodelay (disable Nagle's algorithm)
    pub nodelay: bool,

    /// Socket buffer size for SO_RCVBUF/SO_SNDBUF
    pub socket_buffer_size: usize,
}

impl Default for TcpSourceConfig {
    fn default() -> Self {
        TcpSourceConfig {
            addr: "0.0.0.0:601".into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_line_size: DEFAULT_MAX_LINE_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            nodelay: true,
            socket_buffer_size: DEFAULT_SOCKET_BUFFER_SIZE,
        }
    }
}

impl TcpSourceConfig {
    /// Create config with a custom bind address
    pub fn with_addr(addr: impl Into<String>) -> Self {
        TcpSourceConfig {
            addr: addr.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Syslog TCP source metrics
#[derive(Debug, Default)]
pub struct TcpSourceMetrics {
    /// Base source metrics
    pub base: SourceMetrics,

    /// Oversized lines dropped
    pub lines_oversized: AtomicU64,

    /// Connections closed by the read deadline
    pub read_timeouts: AtomicU64,
}

impl TcpSourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        TcpSourceMetrics {
            base: SourceMetrics::new(),
            lines_oversized: AtomicU64::new(0),
            read_timeouts: AtomicU64::new(0),
        }
    }

    /// Record an oversized line
    #[inline]
    pub fn line_oversized(&self) {
        self.lines_oversized.fetch_add(1, Ordering::Relaxed);
        self.base.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a read deadline expiry
    #[inline]
    pub fn read_timeout(&self) {
        self.read_timeouts.fetch_add(1, Ordering::Relaxed);
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Syslog TCP source errors
#[derive(Debug, thiserror::Error)]
pub enum TcpSourceError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// =============================================================================
// Source Implementation
// =============================================================================

/// Syslog TCP source
///
/// One accept loop plus one task per connection. Each delivered line goes to
/// the shared [`LineHandler`] together with the peer IP.
pub struct TcpSource {
    config: TcpSourceConfig,
    handler: Arc<dyn LineHandler>,
    metrics: Arc<TcpSourceMetrics>,
    running: Arc<AtomicBool>,
}

impl TcpSource {
    /// Create a new TCP source
    pub fn new(config: TcpSourceConfig, handler: Arc<dyn LineHandler>) -> Self {
        TcpSource {
            config,
            handler,
            metrics: Arc::new(TcpSourceMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<TcpSourceMetrics> {
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

    /// Configure socket options using socket2 (Unix only)
    #[cfg(unix)]
    fn configure_socket(&self, stream: &TcpStream) {
        let fd = stream.as_raw_fd();

        // SAFETY: the fd is borrowed for the duration of this call; forget()
        // below keeps socket2 from closing it - tokio still owns it.
        let socket = unsafe { Socket::from_raw_fd(fd) };

        if self.config.nodelay {
            if let Err(err) = socket.set_nodelay(true) {
                tracing::warn!(error = %err, "failed to set TCP_NODELAY");
            }
        }

        if let Err(err) = socket.set_recv_buffer_size(self.config.socket_buffer_size) {
            tracing::warn!(error = %err, "failed to set SO_RCVBUF");
        }
        if let Err(err) = socket.set_send_buffer_size(self.config.socket_buffer_size) {
            tracing::warn!(error = %err, "failed to set SO_SNDBUF");
        }

        let keepalive = TcpKeepalive::new().with_time(KEEPALIVE_INTERVAL);
        if let Err(err) = socket.set_tcp_keepalive(&keepalive) {
            tracing::warn!(error = %err, "failed to set TCP keepalive");
        }

        // Don't close the fd - tokio owns it
        std::mem::forget(socket);
    }

    /// Configure socket - no-op off Unix, tokio's defaults are sufficient
    #[cfg(not(unix))]
    fn configure_socket(&self, _stream: &TcpStream) {}

    /// Run the source (main entry point)
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), TcpSourceError> {
        let listener =
            TcpListener::bind(&self.config.addr)
                .await
                .map_err(|source| TcpSourceError::Bind {
                    address: self.config.addr.clone(),
                    source,
                })?;

        self.running.store(true, Ordering::Relaxed);

        tracing::info!(
            addr = %self.config.addr,
            read_timeout_secs = self.config.read_timeout.as_secs(),
            max_line_size = self.config.max_line_size,
            "syslog TCP source listening"
        );

        self.accept_loop(listener, cancel).await
    }

    /// Accept loop - handles incoming connections
    async fn accept_loop(
        &self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), TcpSourceError> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.running.store(false, Ordering::Relaxed);
                    break;
                }

                accept_result = listener.accept() => {
                    if !self.running.load(Ordering::Relaxed) {
                        break;
                    }
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            self.metrics.base.connection_opened();
                            self.configure_socket(&stream);

                            let conn = Connection {
                                config: self.config.clone(),
                                handler: Arc::clone(&self.handler),
                                metrics: Arc::clone(&self.metrics),
                                running: Arc::clone(&self.running),
                                peer_addr,
                            };

                            tokio::spawn(async move {
                                let peer = conn.peer_addr;
                                if let Err(err) = conn.handle(stream).await {
                                    tracing::debug!(
                                        peer = %peer,
                                        error = %err,
                                        "syslog TCP connection error"
                                    );
                                }
                            });
                        }
                        Err(err) => {
                            if self.running.load(Ordering::Relaxed) {
                                self.metrics.base.error();
                                tracing::warn!(error = %err, "syslog TCP accept error");
                            }
                        }
                    }
                }
            }
        }

        tracing::info!(addr = %self.config.addr, "syslog TCP source stopped");

        Ok(())
    }
}

// =============================================================================
// Connection Handler
// =============================================================================

/// Handles a single TCP connection
struct Connection {
    config: TcpSourceConfig,
    handler: Arc<dyn LineHandler>,
    metrics: Arc<TcpSourceMetrics>,
    running: Arc<AtomicBool>,
    peer_addr: SocketAddr,
}

impl Connection {
    async fn handle(self, stream: TcpStream) -> Result<(), TcpSourceError> {
        // The parser wants the bare IP, not ip:port.
        let remote_ip = self.peer_addr.ip().to_string();

        let mut reader = BufReader::with_capacity(self.config.buffer_size, stream);
        let mut line_buf = Vec::with_capacity(self.config.max_line_size);

        let timeout = if self.config.read_timeout.is_zero() {
            None
        } else {
            Some(self.config.read_timeout)
        };

        loop {
            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            // The deadline is refreshed on every successful read by virtue
            // of wrapping each read.
            let read_result = match timeout {
                Some(deadline) => {
                    match tokio::time::timeout(
                        deadline,
                        read_bounded_line(&mut reader, &mut line_buf, self.config.max_line_size),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => {
                            self.metrics.read_timeout();
                            tracing::debug!(peer = %self.peer_addr, "syslog TCP read deadline expired");
                            break;
                        }
                    }
                }
                None => {
                    read_bounded_line(&mut reader, &mut line_buf, self.config.max_line_size).await
                }
            };

            match read_result {
                Ok(ReadLineResult::Line(bytes_read)) => {
                    let line = trim_trailing_newline(&line_buf);
                    if !line.is_empty() {
                        self.metrics.base.line_delivered(bytes_read as u64);
                        self.handler.handle_line(line, &remote_ip);
                    }
                    line_buf.clear();
                }
                Ok(ReadLineResult::TooLong) => {
                    self.metrics.line_oversized();
                    tracing::debug!(
                        peer = %self.peer_addr,
                        max = self.config.max_line_size,
                        "syslog TCP line too large, dropped"
                    );
                    line_buf.clear();
                }
                Ok(ReadLineResult::Eof) => break,
                Err(err) => {
                    if !is_connection_reset(&err) {
                        self.metrics.base.error();
                        tracing::debug!(
                            peer = %self.peer_addr,
                            error = %err,
                            "syslog TCP read error"
                        );
                    }
                    break;
                }
            }
        }

        self.metrics.base.connection_closed();

        Ok(())
    }
}

// =============================================================================
// Bounded Line Reading
// =============================================================================

/// Result of reading a bounded line
enum ReadLineResult {
    /// Successfully read a line (with byte count including newline)
    Line(usize),
    /// Line exceeded max size and was consumed/discarded
    TooLong,
    /// End of stream
    Eof,
}

/// Read a line with bounded memory:
/// - reads until newline or `max_size` bytes
/// - when `max_size` is hit without a newline, the rest of the line is
///   consumed and discarded so the next read starts on a frame boundary
async fn read_bounded_line<R: AsyncBufReadExt + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_size: usize,
) -> io::Result<ReadLineResult> {
    buf.clear();

    let mut total_bytes = 0;
    let mut found_newline = false;
    let mut exceeded_limit = false;

    loop {
        let available = reader.fill_buf().await?;

        if available.is_empty() {
            if total_bytes == 0 {
                return Ok(ReadLineResult::Eof);
            }
            break;
        }

        let newline_pos = available.iter().position(|&b| b == b'\n');
        let (bytes_to_consume, done) = match newline_pos {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };

        let space_remaining = max_size.saturating_sub(buf.len());

        if !exceeded_limit && bytes_to_consume <= space_remaining {
            buf.extend_from_slice(&available[..bytes_to_consume]);
        } else if !exceeded_limit {
            if space_remaining > 0 {
                buf.extend_from_slice(&available[..space_remaining]);
            }
            exceeded_limit = true;
        }

        total_bytes += bytes_to_consume;
        reader.consume(bytes_to_consume);

        if done {
            found_newline = true;
            break;
        }
    }

    if exceeded_limit {
        if !found_newline {
            // Consume the rest of the oversized line.
            loop {
                let available = reader.fill_buf().await?;
                if available.is_empty() {
                    break;
                }
                if let Some(pos) = available.iter().position(|&b| b == b'\n') {
                    reader.consume(pos + 1);
                    break;
                }
                let len = available.len();
                reader.consume(len);
            }
        }
        return Ok(ReadLineResult::TooLong);
    }

    Ok(ReadLineResult::Line(total_bytes))
}

/// Trim a trailing LF or CRLF.
pub(crate) fn trim_trailing_newline(data: &[u8]) -> &[u8] {
    let mut end = data.len();

    if end > 0 && data[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && data[end - 1] == b'\r' {
            end -= 1;
        }
    }

    &data[..end]
}

/// Check if error is a connection reset (expected during shutdown)
fn is_connection_reset(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tcp_test;
