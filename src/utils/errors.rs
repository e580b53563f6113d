use bytes::Bytes;
use http::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use http::{HeaderValue, Response, StatusCode};
use http_body_util::Full;
use std::io;
use thiserror::Error;

/// Realm advertised on a failed inbound authentication.
pub const AUTH_REALM: &str = "Dogecoin RPC";
/// Full `WWW-Authenticate` challenge for [`AUTH_REALM`].
pub const AUTH_CHALLENGE: &str = "Basic realm=\"Dogecoin RPC\"";

/// Startup configuration problems. Always fatal, raised before any listener binds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingField(&'static str),

    #[error("incomplete credential: {0} requires both a username and a password")]
    IncompleteCredential(&'static str),

    #[error("at least one of the RPC or relay protocols must be enabled")]
    NoProtocolEnabled,

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to load config file {path}: {reason}")]
    File { path: String, reason: String },
}

/// Unified error type for the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {protocol} listener on {addr}: {source}")]
    Bind {
        protocol: &'static str,
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("inbound authentication failed")]
    Unauthorized,

    #[error("failed to build upstream request: {0}")]
    InvalidRequest(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("failed to connect to upstream {addr}: {reason}")]
    UpstreamConnect { addr: String, reason: String },

    #[error("monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failures of one health-monitor poll or submission. Logged, never fatal.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

impl ProxyError {
    /// HTTP status this error surfaces as on the RPC port.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::Upstream(_) | ProxyError::UpstreamConnect { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error into a response for the caller.
    ///
    /// Bodies are fixed strings; the underlying error text is logged by the
    /// caller and never written to the wire.
    pub fn to_response(&self) -> Response<Full<Bytes>> {
        let message = match self {
            ProxyError::Unauthorized => "Unauthorized\n",
            ProxyError::InvalidRequest(_) => "Failed to create request\n",
            ProxyError::Upstream(_) | ProxyError::UpstreamConnect { .. } => "Upstream error\n",
            _ => "Internal server error\n",
        };

        let mut resp = Response::new(Full::new(Bytes::from_static(message.as_bytes())));
        *resp.status_mut() = self.status();
        let headers = resp.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
        if matches!(self, ProxyError::Unauthorized) {
            headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_CHALLENGE));
        }
        resp
    }
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, ProxyError>;
