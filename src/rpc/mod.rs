//! RPC module
//!
//! - `RpcProxy`: authenticate, rewrite `Authorization`, forward, relay response
//! - `RpcServer`: HTTP/1.1 accept loop driving `RpcProxy`
//!
//! JSON-RPC payloads are never parsed; bodies are streamed in both directions.

pub mod proxy;
pub mod server;

pub use proxy::{ProxyBody, RpcProxy};
pub use server::RpcServer;
