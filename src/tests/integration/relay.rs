use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};

use super::*;
use crate::utils::ProxyError;

/// Node stand-in that publishes a fixed frame to each subscriber, then closes.
async fn publishing_node(frame: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut s, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = s.write_all(frame).await;
                let _ = s.shutdown().await;
            });
        }
    });
    addr
}

#[tokio::test]
async fn test_stream_bytes_arrive_unchanged() {
    let frame: &'static [u8] = b"\xff\x00\x00\x00\x00\x00\x00\x00\x01\x7fhashblock";
    let node = publishing_node(frame).await;
    let running = start(loopback_config(closed_addr().await, node)).await;

    let mut sub = TcpStream::connect(running.relay_addr.unwrap()).await.unwrap();
    let mut got = Vec::new();
    timeout(Duration::from_secs(2), sub.read_to_end(&mut got)).await.unwrap().unwrap();
    assert_eq!(got, frame);

    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_dial_failure_closes_client_and_listener_keeps_serving() {
    // upstream comes up only after the first client has been turned away
    let upstream = closed_addr().await;
    let running = start(loopback_config(closed_addr().await, upstream)).await;
    let relay_addr = running.relay_addr.unwrap();

    let mut first = TcpStream::connect(relay_addr).await.unwrap();
    let mut buf = Vec::new();
    let n = timeout(Duration::from_secs(2), first.read_to_end(&mut buf)).await.unwrap().unwrap_or(0);
    assert_eq!(n, 0);

    let node = TcpListener::bind(upstream).await.unwrap();
    tokio::spawn(async move {
        let (mut s, _) = node.accept().await.unwrap();
        s.write_all(b"hello").await.unwrap();
        s.shutdown().await.unwrap();
    });

    let mut second = TcpStream::connect(relay_addr).await.unwrap();
    let mut got = Vec::new();
    timeout(Duration::from_secs(2), second.read_to_end(&mut got)).await.unwrap().unwrap();
    assert_eq!(got, b"hello");

    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_client_half_close_leaves_reply_path_open() {
    let node = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let node_addr = node.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut s, _) = node.accept().await.unwrap();
        let mut req = Vec::new();
        s.read_to_end(&mut req).await.unwrap();
        s.write_all(format!("got {} bytes", req.len()).as_bytes()).await.unwrap();
        s.shutdown().await.unwrap();
    });

    let running = start(loopback_config(closed_addr().await, node_addr)).await;
    let mut c = TcpStream::connect(running.relay_addr.unwrap()).await.unwrap();
    c.write_all(&[1u8; 4096]).await.unwrap();
    c.shutdown().await.unwrap();

    let mut reply = String::new();
    timeout(Duration::from_secs(2), c.read_to_string(&mut reply)).await.unwrap().unwrap();
    assert_eq!(reply, "got 4096 bytes");

    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_port_in_use_is_fatal() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut cfg = loopback_config(closed_addr().await, closed_addr().await);
    cfg.rpc_port = taken.local_addr().unwrap().port();

    let err = Gateway::new(cfg).start().await.err().unwrap();
    assert!(matches!(err, ProxyError::Bind { protocol: "rpc", .. }));
}

#[tokio::test]
async fn test_connection_cap_queues_extra_clients() {
    let node = publishing_node(b"x").await;
    let mut cfg = loopback_config(closed_addr().await, node);
    cfg.limits.max_connections = Some(1);
    let running = start(cfg).await;
    let relay_addr = running.relay_addr.unwrap();

    // every client is served eventually, one at a time
    for _ in 0..3 {
        let mut c = TcpStream::connect(relay_addr).await.unwrap();
        let mut got = Vec::new();
        timeout(Duration::from_secs(2), c.read_to_end(&mut got)).await.unwrap().unwrap();
        assert_eq!(got, b"x");
    }

    running.handle.shutdown().await;
}
