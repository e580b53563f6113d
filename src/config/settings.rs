use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::auth::Credential;
use crate::config::args::ProxyArgs;
use crate::utils::ConfigError;

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_RPC_PORT: u16 = 22555;
pub const DEFAULT_RELAY_PORT: u16 = 28332;

/// Static credential every pup on the platform is issued for talking to Core.
pub const INTERNAL_USERNAME: &str = "dogebox_core_pup_temporary_static_username";
pub const INTERNAL_PASSWORD: &str = "dogebox_core_pup_temporary_static_password";

/// Deployment posture. Decides which credential pair is checked on the way in,
/// which one is presented on the way out, and which upstream settings apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// local pups -> local node
    Gateway,
    /// remote consumers -> local node
    RemoteInbound,
    /// local pups -> node on another host
    RemoteOutbound,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Gateway => "gateway",
            Role::RemoteInbound => "remote-inbound",
            Role::RemoteOutbound => "remote-outbound",
        };
        f.write_str(s)
    }
}

/// Concurrency and timeout knobs. `None` keeps the unbounded behaviour:
/// no connection ceiling and no timeout on upstream calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionLimits {
    pub max_connections: Option<usize>,
    pub upstream_timeout: Option<Duration>,
}

/// Immutable proxy configuration, built once at startup and passed to each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub role: Role,
    pub bind_host: String,
    pub rpc_port: u16,
    pub relay_port: u16,
    /// `http://host:port` of the node RPC surface (empty when RPC is disabled)
    pub rpc_upstream_url: String,
    /// `host:port` of the node relay stream (empty when relay is disabled)
    pub relay_upstream_addr: String,
    pub inbound_credential: Option<Credential>,
    pub outbound_credential: Option<Credential>,
    pub auth_enabled: bool,
    pub rpc_enabled: bool,
    pub relay_enabled: bool,
    pub limits: ConnectionLimits,
}

impl ProxyConfig {
    /// Resolve raw settings into a config for the selected role.
    pub fn resolve(args: ProxyArgs) -> Result<Self, ConfigError> {
        let role = args.role.unwrap_or(Role::Gateway);
        let bind_host = nonempty(args.bind_host).unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());
        let rpc_port = parse_port(args.rpc_port, "rpc-port")?.unwrap_or(DEFAULT_RPC_PORT);
        let relay_port = parse_port(args.relay_port, "relay-port")?.unwrap_or(DEFAULT_RELAY_PORT);

        let default_enabled = !matches!(role, Role::RemoteInbound);
        let rpc_enabled = parse_flag(args.enable_rpc, "enable-rpc")?.unwrap_or(default_enabled);
        let relay_enabled = parse_flag(args.enable_relay, "enable-relay")?.unwrap_or(default_enabled);
        if !rpc_enabled && !relay_enabled {
            return Err(ConfigError::NoProtocolEnabled);
        }

        let user = credential_pair(args.rpc_username, args.rpc_password, "rpc-username/rpc-password")?;
        let internal = credential_pair(
            Some(nonempty(args.internal_username).unwrap_or_else(|| INTERNAL_USERNAME.to_string())),
            Some(nonempty(args.internal_password).unwrap_or_else(|| INTERNAL_PASSWORD.to_string())),
            "internal-username/internal-password",
        )?;

        let (rpc_upstream_url, relay_upstream_addr) = match role {
            Role::Gateway | Role::RemoteInbound => {
                let rpc = if rpc_enabled {
                    let host = required(args.core_rpc_host, "core-rpc-host (DBX_IFACE_CORE_RPC_HOST)")?;
                    let port = parse_port(args.core_rpc_port, "core-rpc-port")?
                        .ok_or(ConfigError::MissingField("core-rpc-port (DBX_IFACE_CORE_RPC_PORT)"))?;
                    rpc_url(&host, port)?
                } else {
                    String::new()
                };
                let relay = if relay_enabled {
                    let host = required(args.core_relay_host, "core-relay-host (DBX_IFACE_CORE_ZMQ_HOST)")?;
                    let port = parse_port(args.core_relay_port, "core-relay-port")?
                        .ok_or(ConfigError::MissingField("core-relay-port (DBX_IFACE_CORE_ZMQ_PORT)"))?;
                    host_port(&host, port)
                } else {
                    String::new()
                };
                (rpc, relay)
            }
            Role::RemoteOutbound => {
                let host = required(args.remote_host, "remote-host (REMOTE_HOST)")?;
                let rpc_port = parse_port(args.remote_rpc_port, "remote-rpc-port")?.unwrap_or(DEFAULT_RPC_PORT);
                let relay_port =
                    parse_port(args.remote_relay_port, "remote-relay-port")?.unwrap_or(DEFAULT_RELAY_PORT);
                let rpc = if rpc_enabled { rpc_url(&host, rpc_port)? } else { String::new() };
                let relay = if relay_enabled { host_port(&host, relay_port) } else { String::new() };
                (rpc, relay)
            }
        };

        let (inbound_credential, outbound_credential) = match role {
            Role::Gateway | Role::RemoteInbound => (user, internal),
            Role::RemoteOutbound => (internal, user),
        };
        let auth_enabled = inbound_credential.is_some();

        let max_connections = match nonempty(args.max_connections) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::Invalid {
                        field: "max-connections",
                        reason: format!("expected a positive integer, got {:?}", raw),
                    })
                }
                Ok(n) => Some(n),
            },
            None => None,
        };
        let upstream_timeout = match nonempty(args.upstream_timeout_secs) {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    field: "upstream-timeout-secs",
                    reason: format!("expected whole seconds, got {:?}", raw),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let cfg = ProxyConfig {
            role,
            bind_host,
            rpc_port,
            relay_port,
            rpc_upstream_url,
            relay_upstream_addr,
            inbound_credential,
            outbound_credential,
            auth_enabled,
            rpc_enabled,
            relay_enabled,
            limits: ConnectionLimits { max_connections, upstream_timeout },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the structural invariants. `resolve` always produces a valid config;
    /// this guards configs assembled by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc_enabled && !self.relay_enabled {
            return Err(ConfigError::NoProtocolEnabled);
        }
        if self.auth_enabled && self.inbound_credential.is_none() {
            return Err(ConfigError::MissingField("inbound credential"));
        }
        if self.rpc_enabled {
            let uri: http::Uri = self.rpc_upstream_url.parse().map_err(|e: http::uri::InvalidUri| {
                ConfigError::Invalid { field: "rpc upstream url", reason: e.to_string() }
            })?;
            if uri.scheme_str() != Some("http") || uri.authority().is_none() {
                return Err(ConfigError::Invalid {
                    field: "rpc upstream url",
                    reason: format!("expected http://host:port, got {}", self.rpc_upstream_url),
                });
            }
        }
        if self.relay_enabled && self.relay_upstream_addr.is_empty() {
            return Err(ConfigError::MissingField("relay upstream address"));
        }
        if self.limits.max_connections == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max-connections",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn rpc_listen_addr(&self) -> String {
        host_port(&self.bind_host, self.rpc_port)
    }

    pub fn relay_listen_addr(&self) -> String {
        host_port(&self.bind_host, self.relay_port)
    }
}

/// Join host and port, bracketing bare IPv6 literals.
pub fn host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

fn rpc_url(host: &str, port: u16) -> Result<String, ConfigError> {
    let url = format!("http://{}", host_port(host, port));
    url.parse::<http::Uri>().map_err(|e| ConfigError::Invalid {
        field: "rpc upstream url",
        reason: e.to_string(),
    })?;
    Ok(url)
}

/// Trimmed value, or `None` when unset or blank. Env vars set to "" count as unset.
pub(crate) fn nonempty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required(v: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    nonempty(v).ok_or(ConfigError::MissingField(field))
}

fn parse_port(v: Option<String>, field: &'static str) -> Result<Option<u16>, ConfigError> {
    match nonempty(v) {
        Some(raw) => match raw.parse::<u16>() {
            Ok(p) if p != 0 => Ok(Some(p)),
            _ => Err(ConfigError::Invalid { field, reason: format!("not a valid port: {:?}", raw) }),
        },
        None => Ok(None),
    }
}

fn parse_flag(v: Option<String>, field: &'static str) -> Result<Option<bool>, ConfigError> {
    match nonempty(v) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid { field, reason: format!("not a boolean: {:?}", raw) }),
        },
        None => Ok(None),
    }
}

fn credential_pair(
    username: Option<String>,
    password: Option<String>,
    field: &'static str,
) -> Result<Option<Credential>, ConfigError> {
    // passwords are taken verbatim; only the "unset" check trims
    let username = username.filter(|s| !s.trim().is_empty());
    let password = password.filter(|s| !s.trim().is_empty());
    match (username, password) {
        (Some(u), Some(p)) => Ok(Some(Credential::new(u, p))),
        (None, None) => Ok(None),
        _ => Err(ConfigError::IncompleteCredential(field)),
    }
}
