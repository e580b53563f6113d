use http::header::AUTHORIZATION;
use http::HeaderValue;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::auth::{basic, Credential};
use crate::monitor::status::BlockchainInfo;
use crate::utils::{MonitorError, Result};

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<BlockchainInfo>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// JSON-RPC client for the one call the monitor makes.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    url: String,
    auth: Option<HeaderValue>,
}

impl NodeClient {
    pub fn new(url: &str, credential: Option<&Credential>, timeout: Duration) -> Result<Self> {
        let auth = credential.map(basic::build).transpose()?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(MonitorError::from)?;
        Ok(Self { http, url: url.to_string(), auth })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `getblockchaininfo`. A JSON-RPC `error` member counts as a failure.
    pub async fn blockchain_info(&self) -> std::result::Result<BlockchainInfo, MonitorError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "monitor",
            "method": "getblockchaininfo",
            "params": [],
        });
        let mut req = self.http.post(&self.url).json(&body);
        if let Some(auth) = &self.auth {
            req = req.header(AUTHORIZATION, auth.clone());
        }
        let reply: RpcReply = req.send().await?.json().await?;
        if let Some(err) = reply.error {
            return Err(MonitorError::Rpc(err.message));
        }
        reply.result.ok_or_else(|| MonitorError::Rpc("empty result".into()))
    }
}
