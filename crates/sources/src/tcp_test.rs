//! TCP source tests

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use crate::error::SourceError;
use crate::tcp::{TcpLineSource, TcpSourceConfig};
use crate::traits::LineSource;

// ============================================================================
// Helper Functions
// ============================================================================

/// Bind a listener on an ephemeral port
async fn bind_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    (listener, address)
}

/// Find an address nothing is listening on
async fn unused_address() -> String {
    let (listener, address) = bind_listener().await;
    drop(listener);
    address
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_default() {
    let config = TcpSourceConfig::default();

    assert_eq!(config.id, "tcp");
    assert_eq!(config.address, "127.0.0.1:10001");
    assert_eq!(config.connect_timeout, Duration::from_secs(10));
    assert!(config.read_timeout.is_none());
    assert_eq!(config.max_line_size, 8192);
    assert!(config.nodelay);
    assert!(config.keepalive.is_some());
}

#[test]
fn test_config_with_address() {
    let config = TcpSourceConfig::with_address("10.0.0.5:30003");

    assert_eq!(config.address, "10.0.0.5:30003");
    assert_eq!(config.id, "tcp");
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_reads_lines_from_feeder() {
    let (listener, address) = bind_listener().await;

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"line one\r\nline two\n").await.unwrap();
    });

    let mut source = TcpLineSource::connect(TcpSourceConfig::with_address(address))
        .await
        .unwrap();
    assert!(source.is_connected());

    assert_eq!(source.next_line().await.unwrap().as_deref(), Some("line one"));
    assert_eq!(source.next_line().await.unwrap().as_deref(), Some("line two"));

    server.await.unwrap();
    assert_eq!(source.next_line().await.unwrap(), None);
    assert!(!source.is_connected());

    let snapshot = source.metrics().snapshot();
    assert_eq!(snapshot.connections_total, 1);
    assert_eq!(snapshot.lines_read, 2);
}

#[tokio::test]
async fn test_connect_refused() {
    let address = unused_address().await;

    let result = TcpLineSource::connect(TcpSourceConfig::with_address(address.clone())).await;
    match result {
        Err(SourceError::Connect { address: a, .. }) => assert_eq!(a, address),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("connect should fail"),
    }
}

#[tokio::test]
async fn test_next_line_without_connection() {
    let mut source = TcpLineSource::new(TcpSourceConfig::default());
    assert!(source.can_reconnect());
    assert!(!source.is_connected());

    let err = source.next_line().await.unwrap_err();
    assert!(matches!(err, SourceError::NotConnected));
}

#[tokio::test]
async fn test_read_timeout() {
    let (listener, address) = bind_listener().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(stream);
    });

    let config = TcpSourceConfig {
        address,
        read_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let mut source = TcpLineSource::connect(config).await.unwrap();

    let err = source.next_line().await.unwrap_err();
    assert!(matches!(err, SourceError::ReadTimeout(_)));
    assert!(!source.is_connected());

    server.abort();
}

#[tokio::test]
async fn test_reconnect_after_eof() {
    let (listener, address) = bind_listener().await;

    let server = tokio::spawn(async move {
        for payload in [&b"first\n"[..], &b"second\n"[..]] {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(payload).await.unwrap();
        }
    });

    let mut source = TcpLineSource::connect(TcpSourceConfig::with_address(address))
        .await
        .unwrap();

    assert_eq!(source.next_line().await.unwrap().as_deref(), Some("first"));
    assert_eq!(source.next_line().await.unwrap(), None);

    source.reconnect().await.unwrap();
    assert_eq!(source.next_line().await.unwrap().as_deref(), Some("second"));
    assert_eq!(source.next_line().await.unwrap(), None);

    server.await.unwrap();
    assert_eq!(source.metrics().snapshot().connections_total, 2);
}

#[tokio::test]
async fn test_oversized_line_skipped() {
    let (listener, address) = bind_listener().await;

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let long = vec![b'x'; 200];
        stream.write_all(&long).await.unwrap();
        stream.write_all(b"\nshort\n").await.unwrap();
    });

    let config = TcpSourceConfig {
        address,
        max_line_size: 64,
        ..Default::default()
    };
    let mut source = TcpLineSource::connect(config).await.unwrap();

    assert_eq!(source.next_line().await.unwrap().as_deref(), Some("short"));
    server.await.unwrap();
    assert_eq!(source.metrics().snapshot().lines_oversized, 1);
}
