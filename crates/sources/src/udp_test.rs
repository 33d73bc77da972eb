//! Tests for the syslog UDP source

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use super::{UdpSource, UdpSourceConfig, UdpSourceError, JUMBO_PACKET_SIZE};
use crate::LineHandler;

#[derive(Default)]
struct Capture {
    lines: Mutex<Vec<(Vec<u8>, String)>>,
}

impl Capture {
    fn lines(&self) -> Vec<(Vec<u8>, String)> {
        self.lines.lock().clone()
    }
}

impl LineHandler for Capture {
    fn handle_line(&self, line: &[u8], remote_addr: &str) {
        self.lines.lock().push((line.to_vec(), remote_addr.to_string()));
    }
}

#[test]
fn test_config_defaults() {
    let config = UdpSourceConfig::default();
    assert_eq!(config.addr, "0.0.0.0:514");
    assert_eq!(JUMBO_PACKET_SIZE, 8960);
}

#[tokio::test]
async fn test_invalid_addr() {
    let source = UdpSource::new(
        UdpSourceConfig::with_addr("not-an-address"),
        Arc::new(Capture::default()),
    );
    let result = source.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(UdpSourceError::Addr(_))));
}

#[tokio::test]
async fn test_packets_delivered_with_peer_ip() {
    // Bind on an OS-assigned port, then aim the source at it.
    let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let capture = Arc::new(Capture::default());
    let source = Arc::new(UdpSource::new(
        UdpSourceConfig::with_addr(format!("127.0.0.1:{port}")),
        capture.clone(),
    ));
    let cancel = CancellationToken::new();

    let task = {
        let source = Arc::clone(&source);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let _ = source.run(cancel).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(b"<34>Oct 11 22:14:15 host su: one\n", format!("127.0.0.1:{port}"))
        .await
        .unwrap();
    client
        .send_to(b"two", format!("127.0.0.1:{port}"))
        .await
        .unwrap();
    // Empty packets are dropped with a metric.
    client
        .send_to(b"", format!("127.0.0.1:{port}"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_millis(500), task).await;

    let lines = capture.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].0, b"<34>Oct 11 22:14:15 host su: one");
    assert_eq!(lines[0].1, "127.0.0.1");
    assert_eq!(lines[1].0, b"two");

    assert_eq!(source.metrics().packets_received.load(Ordering::Relaxed), 2);
    assert_eq!(source.metrics().packets_empty.load(Ordering::Relaxed), 1);
}
