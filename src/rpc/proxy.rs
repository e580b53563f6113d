use bytes::Bytes;
use http::header::HOST;
use http::{Request, Response, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::auth::CredentialTranslator;
use crate::config::ProxyConfig;
use crate::utils::metrics::{RPC_AUTH_FAILURES, RPC_REQUESTS, RPC_UPSTREAM_ERRORS};
use crate::utils::{ProxyError, Result, METRICS};

/// Streaming body used on both legs; nothing is buffered in full.
pub type ProxyBody = UnsyncBoxBody<Bytes, hyper::Error>;

/// HTTP reverse proxy for the node RPC surface.
///
/// Per request: authenticate (if enabled), rewrite `Authorization`, forward once,
/// stream the upstream response back unchanged. Shared state is read-only.
#[derive(Clone)]
pub struct RpcProxy {
    client: Client<HttpConnector, ProxyBody>,
    upstream: Arc<str>,
    translator: Arc<CredentialTranslator>,
    timeout: Option<Duration>,
}

impl RpcProxy {
    pub fn new(upstream: &str, translator: CredentialTranslator, timeout: Option<Duration>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            client,
            upstream: Arc::from(upstream.trim_end_matches('/')),
            translator: Arc::new(translator),
            timeout,
        }
    }

    pub fn from_config(cfg: &ProxyConfig) -> Result<Self> {
        let translator = CredentialTranslator::from_config(cfg)?;
        Ok(Self::new(&cfg.rpc_upstream_url, translator, cfg.limits.upstream_timeout))
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub fn auth_enabled(&self) -> bool {
        self.translator.auth_enabled()
    }

    /// Serve one request. Never fails: errors become 401/500/502 responses.
    pub async fn handle(&self, req: Request<Incoming>, remote: SocketAddr) -> Response<ProxyBody> {
        METRICS.inc_counter(RPC_REQUESTS);
        info!(method = %req.method(), path = %req.uri().path(), remote = %remote, "rpc request");

        let req = req.map(|body| body.boxed_unsync());
        match self.forward(req).await {
            Ok(resp) => resp,
            Err(e) => {
                match &e {
                    ProxyError::Unauthorized => {
                        METRICS.inc_counter(RPC_AUTH_FAILURES);
                        warn!(remote = %remote, "rpc authentication failed");
                    }
                    ProxyError::Upstream(_) => {
                        METRICS.inc_counter(RPC_UPSTREAM_ERRORS);
                        warn!(remote = %remote, error = %e, "upstream rpc request failed");
                    }
                    _ => error!(remote = %remote, error = %e, "rpc request rejected"),
                }
                e.to_response().map(|body| body.map_err(|never| match never {}).boxed_unsync())
            }
        }
    }

    async fn forward(&self, req: Request<ProxyBody>) -> Result<Response<ProxyBody>> {
        self.translator.check_inbound(req.headers())?;
        let upstream_req = self.build_upstream_request(req)?;

        let pending = self.client.request(upstream_req);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| ProxyError::Upstream(format!("no response within {:?}", limit)))?,
            None => pending.await,
        };
        let resp = result.map_err(|e| ProxyError::Upstream(format_client_error(&e)))?;
        Ok(resp.map(|body| body.boxed_unsync()))
    }

    /// Retarget a caller request at the upstream: same method, path and query,
    /// same headers except `Host` (set by the client) and `Authorization` (rewritten).
    pub fn build_upstream_request<B>(&self, req: Request<B>) -> Result<Request<B>> {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let uri: Uri = format!("{}{}", self.upstream, path)
            .parse()
            .map_err(|e: http::uri::InvalidUri| ProxyError::InvalidRequest(e.to_string()))?;

        let mut headers = parts.headers;
        headers.remove(HOST);
        self.translator.rewrite_outbound(&mut headers);

        let mut upstream = Request::new(body);
        *upstream.method_mut() = parts.method;
        *upstream.uri_mut() = uri;
        *upstream.headers_mut() = headers;
        Ok(upstream)
    }
}

// hyper_util's Display is terse ("client error (Connect)"); keep the cause chain for the log line
fn format_client_error(e: &hyper_util::client::legacy::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
