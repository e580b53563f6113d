//! Credential-translating proxy in front of a Dogecoin Core node.
//!
//! - `auth`: HTTP Basic check and the per-role credential rewrite
//! - `rpc`: HTTP reverse proxy for the node RPC port
//! - `relay`: raw TCP relay for the node event stream
//! - `gateway`: listener manager, lifecycle and CLI
//! - `monitor`: remote node health reporting
//! - `config`, `utils`: settings, errors, logging, metrics

pub mod auth;
pub mod config;
pub mod gateway;
pub mod monitor;
pub mod relay;
pub mod rpc;
pub mod utils;

#[cfg(test)]
mod tests;
