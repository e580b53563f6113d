//! Remote node health monitor
//!
//! - `NodeClient`: `getblockchaininfo` over JSON-RPC
//! - `status`: Connected / Disconnected documents in the platform's `{"value": ...}` shape
//! - `StatusSink`: where documents go (HTTP POST in production)
//! - `Monitor`: startup delay, then one poll per interval

pub mod args;
pub mod client;
pub mod runner;
pub mod sink;
pub mod status;

pub use args::{MonitorArgs, MonitorConfig};
pub use client::NodeClient;
pub use runner::Monitor;
pub use sink::{HttpStatusSink, MemoryStatusSink, StatusSink};
pub use status::{bytes_to_human, BlockchainInfo};
