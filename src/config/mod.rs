//! Configuration: raw settings (CLI / env / TOML) and the resolved, immutable `ProxyConfig`.

pub mod args;
pub mod settings;

pub use args::ProxyArgs;
pub use settings::{host_port, ConnectionLimits, ProxyConfig, Role};
