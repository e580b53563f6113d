use clap::Args;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::settings::Role;
use crate::utils::serde_helpers::{opt_scalar_string, redacted};
use crate::utils::ConfigError;

/// Raw proxy settings as given on the command line, in the environment, or in a
/// TOML file. Everything is optional here; `ProxyConfig::resolve` applies the
/// per-role defaults and requirements.
#[derive(Args, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyArgs {
    /// TOML file with any of these settings (command line and env take precedence)
    #[arg(long, env = "PROXY_CONFIG")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// deployment role
    #[arg(long, env = "PROXY_ROLE", value_enum)]
    pub role: Option<Role>,

    /// address both listeners bind to
    #[arg(long, env = "DBX_PUP_IP")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub bind_host: Option<String>,

    #[arg(long, env = "PROXY_RPC_PORT")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub rpc_port: Option<String>,

    #[arg(long, env = "PROXY_RELAY_PORT")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub relay_port: Option<String>,

    /// local node RPC host (gateway / remote-inbound)
    #[arg(long, env = "DBX_IFACE_CORE_RPC_HOST")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub core_rpc_host: Option<String>,

    #[arg(long, env = "DBX_IFACE_CORE_RPC_PORT")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub core_rpc_port: Option<String>,

    /// local node relay stream host (gateway / remote-inbound)
    #[arg(long, env = "DBX_IFACE_CORE_ZMQ_HOST")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub core_relay_host: Option<String>,

    #[arg(long, env = "DBX_IFACE_CORE_ZMQ_PORT")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub core_relay_port: Option<String>,

    /// remote node host (remote-outbound)
    #[arg(long, env = "REMOTE_HOST")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub remote_host: Option<String>,

    #[arg(long, env = "REMOTE_RPC_PORT")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub remote_rpc_port: Option<String>,

    #[arg(long, env = "REMOTE_ZMQ_PORT")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub remote_relay_port: Option<String>,

    /// user-configured RPC credential
    #[arg(long, env = "RPC_USERNAME")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub rpc_username: Option<String>,

    #[arg(long, env = "RPC_PASSWORD", hide_env_values = true)]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub rpc_password: Option<String>,

    /// platform-issued static pup credential
    #[arg(long, env = "INTERNAL_RPC_USERNAME")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub internal_username: Option<String>,

    #[arg(long, env = "INTERNAL_RPC_PASSWORD", hide_env_values = true)]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub internal_password: Option<String>,

    #[arg(long, env = "ENABLE_RPC")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub enable_rpc: Option<String>,

    #[arg(long, env = "ENABLE_ZMQ")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub enable_relay: Option<String>,

    /// cap on concurrently served connections per listener (unset = unbounded)
    #[arg(long, env = "PROXY_MAX_CONNECTIONS")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub max_connections: Option<String>,

    /// bound on the upstream RPC call and relay dial (unset = none)
    #[arg(long, env = "PROXY_UPSTREAM_TIMEOUT_SECS")]
    #[serde(deserialize_with = "opt_scalar_string")]
    pub upstream_timeout_secs: Option<String>,
}

// passwords must never reach the logs
impl fmt::Debug for ProxyArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyArgs")
            .field("config", &self.config)
            .field("role", &self.role)
            .field("bind_host", &self.bind_host)
            .field("rpc_port", &self.rpc_port)
            .field("relay_port", &self.relay_port)
            .field("core_rpc_host", &self.core_rpc_host)
            .field("core_rpc_port", &self.core_rpc_port)
            .field("core_relay_host", &self.core_relay_host)
            .field("core_relay_port", &self.core_relay_port)
            .field("remote_host", &self.remote_host)
            .field("remote_rpc_port", &self.remote_rpc_port)
            .field("remote_relay_port", &self.remote_relay_port)
            .field("rpc_username", &self.rpc_username)
            .field("rpc_password", &redacted(&self.rpc_password))
            .field("internal_username", &self.internal_username)
            .field("internal_password", &redacted(&self.internal_password))
            .field("enable_rpc", &self.enable_rpc)
            .field("enable_relay", &self.enable_relay)
            .field("max_connections", &self.max_connections)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .finish()
    }
}

impl ProxyArgs {
    /// Load settings from a TOML file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_err = |reason: String| ConfigError::File { path: path.display().to_string(), reason };
        let data = fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;
        toml::from_str(&data).map_err(|e| file_err(e.to_string()))
    }

    /// Fill every unset field from `fallback`.
    pub fn or(self, fallback: ProxyArgs) -> ProxyArgs {
        ProxyArgs {
            config: self.config.or(fallback.config),
            role: self.role.or(fallback.role),
            bind_host: self.bind_host.or(fallback.bind_host),
            rpc_port: self.rpc_port.or(fallback.rpc_port),
            relay_port: self.relay_port.or(fallback.relay_port),
            core_rpc_host: self.core_rpc_host.or(fallback.core_rpc_host),
            core_rpc_port: self.core_rpc_port.or(fallback.core_rpc_port),
            core_relay_host: self.core_relay_host.or(fallback.core_relay_host),
            core_relay_port: self.core_relay_port.or(fallback.core_relay_port),
            remote_host: self.remote_host.or(fallback.remote_host),
            remote_rpc_port: self.remote_rpc_port.or(fallback.remote_rpc_port),
            remote_relay_port: self.remote_relay_port.or(fallback.remote_relay_port),
            rpc_username: self.rpc_username.or(fallback.rpc_username),
            rpc_password: self.rpc_password.or(fallback.rpc_password),
            internal_username: self.internal_username.or(fallback.internal_username),
            internal_password: self.internal_password.or(fallback.internal_password),
            enable_rpc: self.enable_rpc.or(fallback.enable_rpc),
            enable_relay: self.enable_relay.or(fallback.enable_relay),
            max_connections: self.max_connections.or(fallback.max_connections),
            upstream_timeout_secs: self.upstream_timeout_secs.or(fallback.upstream_timeout_secs),
        }
    }

    /// Overlay the `--config` file (if any) underneath the explicit settings.
    pub fn with_file_overlay(self) -> Result<Self, ConfigError> {
        match self.config.clone() {
            Some(path) => {
                let file = Self::load_file(path)?;
                Ok(self.or(file))
            }
            None => Ok(self),
        }
    }
}
