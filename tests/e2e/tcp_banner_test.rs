use sshpot::attempts::record::AttemptRecord;
use sshpot::attempts::MemorySink;
use sshpot::config::types::AppConfig;
use sshpot::context::AppContext;
use sshpot::tcp::{accept_tcp, MAX_PAYLOAD};

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

struct TestTcp {
    port: u16,
    sink: Arc<MemorySink>,
    shutdown: CancellationToken,
}

impl Drop for TestTcp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn start_tcp(read_timeout_secs: u64) -> TestTcp {
    let mut config = AppConfig::default();
    config.tcp.read_timeout_secs = read_timeout_secs;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let sink = Arc::new(MemorySink::new());
    let ctx = Arc::new(AppContext::new(config, sink.clone()));
    let shutdown = CancellationToken::new();
    tokio::spawn(accept_tcp(listener, ctx, TaskTracker::new(), shutdown.clone()));
    TestTcp {
        port,
        sink,
        shutdown,
    }
}

async fn wait_for_records(sink: &MemorySink, n: usize) -> Vec<AttemptRecord> {
    for _ in 0..50 {
        let records = sink.records();
        if records.len() >= n {
            return records;
        }
        sleep(Duration::from_millis(50)).await;
    }
    sink.records()
}

#[tokio::test]
async fn test_banner_then_payload_recorded() {
    let srv = start_tcp(5).await;
    let mut stream = TcpStream::connect(("127.0.0.1", srv.port)).await.unwrap();

    let mut banner = vec![0u8; 64];
    let n = stream.read(&mut banner).await.unwrap();
    assert_eq!(&banner[..n], b"Welcome to the service!\n");

    stream.write_all(b"USER anonymous\r\n").await.unwrap();
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty(), "server closes after one payload");

    let records = wait_for_records(&srv.sink, 1).await;
    assert_eq!(records.len(), 1);
    match &records[0] {
        AttemptRecord::Access {
            ip, protocol, data, ..
        } => {
            assert_eq!(ip, "127.0.0.1");
            assert_eq!(protocol, "tcp");
            assert_eq!(data, "USER anonymous\r\n");
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[tokio::test]
async fn test_binary_payload_is_decoded_lossily() {
    let srv = start_tcp(5).await;
    let mut stream = TcpStream::connect(("127.0.0.1", srv.port)).await.unwrap();
    let mut banner = vec![0u8; 64];
    stream.read(&mut banner).await.unwrap();

    stream.write_all(&[0x16, 0x03, 0x01, 0xff, 0xfe]).await.unwrap();
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();

    let records = wait_for_records(&srv.sink, 1).await;
    match &records[0] {
        AttemptRecord::Access { data, .. } => {
            assert!(data.starts_with("\u{16}\u{3}\u{1}"));
            assert!(data.contains('\u{FFFD}'));
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[tokio::test]
async fn test_oversized_payload_is_truncated() {
    let srv = start_tcp(5).await;
    let mut stream = TcpStream::connect(("127.0.0.1", srv.port)).await.unwrap();
    let mut banner = vec![0u8; 64];
    stream.read(&mut banner).await.unwrap();

    let _ = stream.write_all(&vec![b'A'; MAX_PAYLOAD * 4]).await;
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest).await;

    let records = wait_for_records(&srv.sink, 1).await;
    match &records[0] {
        AttemptRecord::Access { data, .. } => assert!(data.len() <= MAX_PAYLOAD),
        other => panic!("unexpected record: {other:?}"),
    }
}

#[tokio::test]
async fn test_silent_client_recorded_as_empty() {
    let srv = start_tcp(1).await;
    let mut stream = TcpStream::connect(("127.0.0.1", srv.port)).await.unwrap();
    let mut all = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut all))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(all, b"Welcome to the service!\n");

    let records = wait_for_records(&srv.sink, 1).await;
    match &records[0] {
        AttemptRecord::Access { data, .. } => assert!(data.is_empty()),
        other => panic!("unexpected record: {other:?}"),
    }
}
