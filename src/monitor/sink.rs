use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::utils::MonitorError;

/// Destination for status documents.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn submit(&self, doc: &Value) -> Result<(), MonitorError>;
}

/// Posts documents as JSON to the platform metrics endpoint.
#[derive(Clone)]
pub struct HttpStatusSink {
    http: reqwest::Client,
    url: String,
}

impl HttpStatusSink {
    pub fn new(url: impl Into<String>) -> Result<Self, MonitorError> {
        // platform-internal endpoint, never routed through an environment proxy
        let http = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self { http, url: url.into() })
    }
}

#[async_trait]
impl StatusSink for HttpStatusSink {
    async fn submit(&self, doc: &Value) -> Result<(), MonitorError> {
        let resp = self.http.post(&self.url).json(doc).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(MonitorError::Status { status: status.as_u16(), body });
        }
        Ok(())
    }
}

/// Keeps every submitted document in memory.
#[derive(Clone, Default)]
pub struct MemoryStatusSink {
    docs: Arc<Mutex<Vec<Value>>>,
}

impl MemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<Value> {
        self.docs.lock().clone()
    }
}

#[async_trait]
impl StatusSink for MemoryStatusSink {
    async fn submit(&self, doc: &Value) -> Result<(), MonitorError> {
        self.docs.lock().push(doc.clone());
        Ok(())
    }
}
