use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::Response;
use http_body_util::Full;
use serde_json::{json, Value};
use std::time::Duration;

use super::*;
use crate::auth::basic;
use crate::monitor::{HttpStatusSink, MemoryStatusSink, Monitor, MonitorConfig, StatusSink};
use crate::utils::MonitorError;

fn json_reply(body: Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn monitor_config(node: SocketAddr, credential: Option<Credential>) -> MonitorConfig {
    MonitorConfig {
        remote_host: "node.example".into(),
        rpc_url: format!("http://{}", node),
        credential,
        metrics_url: "http://127.0.0.1:1/dbx/metrics".into(),
        startup_delay: Duration::ZERO,
        interval: Duration::from_secs(10),
        poll_timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn test_healthy_node_reports_connected_document() {
    let (node, log) = mock_http(|_| {
        json_reply(json!({
            "result": {
                "chain": "main",
                "blocks": 5_100_000,
                "headers": 5_100_000,
                "difficulty": 21_000_000.5,
                "verificationprogress": 1.0,
                "initialblockdownload": false,
                "size_on_disk": 512u64 * 1024 * 1024,
            },
            "error": null,
            "id": "monitor",
        }))
    })
    .await;

    let sink = MemoryStatusSink::new();
    let monitor = Monitor::new(monitor_config(node, Some(user())), Arc::new(sink.clone())).unwrap();
    monitor.tick().await;

    let docs = sink.documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["status"]["value"], "Connected");
    assert_eq!(docs[0]["remote_host"]["value"], "node.example");
    assert_eq!(docs[0]["blocks"]["value"], 5_100_000);
    assert_eq!(docs[0]["verification_progress"]["value"], "100.00%");
    assert_eq!(docs[0]["initial_block_download"]["value"], "No");
    assert_eq!(docs[0]["chain_size_human"]["value"], "512.00 MB");

    let seen = log.lock().clone();
    let call: Value = serde_json::from_slice(&seen[0].body).unwrap();
    assert_eq!(call["method"], "getblockchaininfo");
    assert_eq!(call["id"], "monitor");
    let auth = seen[0].headers.get(AUTHORIZATION).unwrap();
    assert!(basic::validate(auth.as_bytes(), &user()));
}

#[tokio::test]
async fn test_rpc_error_reports_disconnected() {
    let (node, _) = mock_http(|_| {
        json_reply(json!({"result": null, "error": {"code": -28, "message": "Loading block index..."}, "id": "monitor"}))
    })
    .await;

    let sink = MemoryStatusSink::new();
    let monitor = Monitor::new(monitor_config(node, None), Arc::new(sink.clone())).unwrap();
    monitor.tick().await;

    assert_eq!(sink.documents(), vec![json!({"status": {"value": "Disconnected"}, "remote_host": {"value": "node.example"}})]);
}

#[tokio::test]
async fn test_http_sink_posts_json_and_flags_non_200() {
    let (collector, log) = mock_http(|rec| {
        let status = if rec.body.is_empty() { 400 } else { 200 };
        Response::builder().status(status).body(Full::new(Bytes::new())).unwrap()
    })
    .await;
    let sink = HttpStatusSink::new(format!("http://{}/dbx/metrics", collector)).unwrap();
    let doc = json!({"status": {"value": "Connected"}});
    sink.submit(&doc).await.unwrap();

    let seen = log.lock().clone();
    assert_eq!(seen[0].uri, "/dbx/metrics");
    assert_eq!(seen[0].headers.get("content-type").unwrap(), "application/json");
    assert_eq!(serde_json::from_slice::<Value>(&seen[0].body).unwrap(), doc);

    let (failing, _) = mock_http(|_| Response::builder().status(503).body(Full::new(Bytes::from_static(b"busy"))).unwrap()).await;
    let sink = HttpStatusSink::new(format!("http://{}/dbx/metrics", failing)).unwrap();
    match sink.submit(&doc).await {
        Err(MonitorError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("expected status error, got {:?}", other.err()),
    }
}
