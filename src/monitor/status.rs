use serde::Deserialize;
use serde_json::{json, Value};

const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * MB;

/// Subset of `getblockchaininfo` the monitor reports.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlockchainInfo {
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub blocks: u64,
    #[serde(default)]
    pub headers: u64,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default, rename = "verificationprogress")]
    pub verification_progress: f64,
    #[serde(default, rename = "initialblockdownload")]
    pub initial_block_download: bool,
    #[serde(default)]
    pub size_on_disk: u64,
}

/// Status document for a node that answered the poll.
pub fn connected(remote_host: &str, info: &BlockchainInfo) -> Value {
    json!({
        "status": { "value": "Connected" },
        "remote_host": { "value": remote_host },
        "chain": { "value": info.chain },
        "blocks": { "value": info.blocks },
        "headers": { "value": info.headers },
        "difficulty": { "value": info.difficulty },
        "verification_progress": { "value": format!("{:.2}%", info.verification_progress * 100.0) },
        "initial_block_download": { "value": if info.initial_block_download { "Yes" } else { "No" } },
        "chain_size_human": { "value": bytes_to_human(info.size_on_disk) },
    })
}

/// Status document for a failed poll.
pub fn disconnected(remote_host: &str) -> Value {
    json!({
        "status": { "value": "Disconnected" },
        "remote_host": { "value": remote_host },
    })
}

/// MB below one GiB, GB from there on, two decimals.
pub fn bytes_to_human(bytes: u64) -> String {
    let b = bytes as f64;
    if b < GB {
        format!("{:.2} MB", b / MB)
    } else {
        format!("{:.2} GB", b / GB)
    }
}
