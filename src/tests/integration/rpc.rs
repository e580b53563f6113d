use bytes::Bytes;
use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use http::{Response, StatusCode};
use http_body_util::Full;
use std::time::Duration;

use super::*;
use crate::auth::basic;

fn ok_with_trace(rec: &Recorded) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("X-Trace", "abc")
        .header("content-type", "application/json")
        .body(Full::new(rec.body.clone()))
        .unwrap()
}

#[tokio::test]
async fn test_authorized_request_is_forwarded_with_internal_credential() {
    let (node, log) = mock_http(ok_with_trace).await;
    let running = start(loopback_config(node, closed_addr().await)).await;
    let url = format!("http://{}/", running.rpc_addr.unwrap());

    let payload = r#"{"jsonrpc":"1.0","id":"t","method":"getblockcount","params":[]}"#;
    let resp = http_client()
        .post(&url)
        .basic_auth("dogebox", Some("s3cr3t"))
        .body(payload)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-trace").unwrap(), "abc");
    assert_eq!(resp.text().await.unwrap(), payload);

    let seen = log.lock().clone();
    assert_eq!(seen.len(), 1);
    let auth: Vec<_> = seen[0].headers.get_all(AUTHORIZATION).iter().collect();
    assert_eq!(auth.len(), 1);
    assert!(basic::validate(auth[0].as_bytes(), &internal()));
    assert_eq!(seen[0].body, payload.as_bytes());

    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_wrong_or_missing_credentials_never_reach_upstream() {
    let (node, log) = mock_http(ok_with_trace).await;
    let running = start(loopback_config(node, closed_addr().await)).await;
    let url = format!("http://{}/", running.rpc_addr.unwrap());
    let client = http_client();

    let wrong = client.post(&url).basic_auth("dogebox", Some("S3cr3t")).send().await.unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.headers().get(WWW_AUTHENTICATE).unwrap(), "Basic realm=\"Dogecoin RPC\"");
    assert_eq!(wrong.text().await.unwrap(), "Unauthorized\n");

    let missing = client.post(&url).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let bearer = client.post(&url).header(AUTHORIZATION, "Bearer abc").send().await.unwrap();
    assert_eq!(bearer.status(), StatusCode::UNAUTHORIZED);

    assert!(log.lock().is_empty());
    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let running = start(loopback_config(closed_addr().await, closed_addr().await)).await;
    let url = format!("http://{}/", running.rpc_addr.unwrap());

    let resp = http_client().post(&url).basic_auth("dogebox", Some("s3cr3t")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    // no internal detail on the wire
    assert_eq!(resp.text().await.unwrap(), "Upstream error\n");

    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_silent_upstream_times_out_as_bad_gateway() {
    let mut cfg = loopback_config(silent_upstream().await, closed_addr().await);
    cfg.limits.upstream_timeout = Some(Duration::from_secs(1));
    let running = start(cfg).await;
    let url = format!("http://{}/", running.rpc_addr.unwrap());

    let send = http_client().post(&url).basic_auth("dogebox", Some("s3cr3t")).body("{}").send();
    let resp = tokio::time::timeout(Duration::from_secs(10), send).await.unwrap().unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(resp.text().await.unwrap(), "Upstream error\n");

    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_headers_query_and_error_status_pass_through() {
    let (node, log) = mock_http(|_| {
        Response::builder()
            .status(500)
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .body(Full::new(Bytes::from_static(br#"{"result":null,"error":{"code":-32601}}"#)))
            .unwrap()
    })
    .await;
    let running = start(loopback_config(node, closed_addr().await)).await;
    let url = format!("http://{}/wallet/w1?x=1", running.rpc_addr.unwrap());

    let resp = http_client()
        .post(&url)
        .basic_auth("dogebox", Some("s3cr3t"))
        .header("a", "v1")
        .header("a", "v2")
        .header("b", "v3")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let cookies: Vec<_> = resp.headers().get_all("set-cookie").iter().map(|v| v.to_str().unwrap().to_string()).collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
    assert_eq!(resp.text().await.unwrap(), r#"{"result":null,"error":{"code":-32601}}"#);

    let seen = log.lock().clone();
    assert_eq!(seen[0].uri, "/wallet/w1?x=1");
    let a: Vec<_> = seen[0].headers.get_all("a").iter().map(|v| v.to_str().unwrap().to_string()).collect();
    assert_eq!(a, vec!["v1", "v2"]);
    assert_eq!(seen[0].headers.get("b").unwrap(), "v3");

    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_auth_disabled_forwards_without_caller_credentials() {
    let (node, log) = mock_http(ok_with_trace).await;
    let mut cfg = loopback_config(node, closed_addr().await);
    cfg.auth_enabled = false;
    cfg.inbound_credential = None;
    cfg.outbound_credential = None;
    let running = start(cfg).await;
    let url = format!("http://{}/", running.rpc_addr.unwrap());

    let bare = http_client().post(&url).body("ping").send().await.unwrap();
    assert_eq!(bare.status(), StatusCode::OK);

    let resp = http_client()
        .post(&url)
        .header(AUTHORIZATION, "Basic Z2FyYmFnZQ==")
        .body("ping")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let seen = log.lock().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].body, "ping".as_bytes());
    // no outbound credential: the caller's header is dropped, not passed on
    assert!(seen.iter().all(|r| r.headers.get(AUTHORIZATION).is_none()));

    running.handle.shutdown().await;
}

#[tokio::test]
async fn test_listener_survives_a_failed_request() {
    let (node, log) = mock_http(ok_with_trace).await;
    let running = start(loopback_config(node, closed_addr().await)).await;
    let url = format!("http://{}/", running.rpc_addr.unwrap());
    let client = http_client();

    let bad = client.post(&url).send().await.unwrap();
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
    let good = client.post(&url).basic_auth("dogebox", Some("s3cr3t")).send().await.unwrap();
    assert_eq!(good.status(), StatusCode::OK);
    assert_eq!(log.lock().len(), 1);

    running.handle.shutdown().await;
}
