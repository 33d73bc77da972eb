//! Siphon Sources - Syslog frame readers
//!
//! Listeners that deliver framed lines plus a remote-address string to a
//! shared [`LineHandler`]. Parsing happens downstream; sources only frame.
//!
//! # Available Sources
//!
//! - **TCP** - newline-delimited frames with a per-read deadline
//! - **UDP** - one datagram per record, jumbo-sized receive buffer
//!
//! # Design
//!
//! - Remote addresses are the peer IP only, never the port
//! - Oversized TCP lines are consumed and dropped, not truncated into the
//!   stream
//! - Sources stop on cancellation; connection-reset noise during shutdown is
//!   not treated as an error

mod common;
pub mod tcp;
pub mod udp;

pub use common::SourceMetrics;
pub use tcp::{TcpSource, TcpSourceConfig, TcpSourceError, TcpSourceMetrics};
pub use udp::{UdpSource, UdpSourceConfig, UdpSourceError, UdpSourceMetrics};

/// Handler invoked for every framed line with its remote address.
///
/// Implementations must be cheap and non-blocking: they run on the source's
/// read loop.
pub trait LineHandler: Send + Sync + 'static {
    fn handle_line(&self, line: &[u8], remote_addr: &str);
}

impl<F> LineHandler for F
where
    F: Fn(&[u8], &str) + Send + Sync + 'static,
{
    fn handle_line(&self, line: &[u8], remote_addr: &str) {
        self(line, remote_addr)
    }
}
