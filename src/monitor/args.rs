use clap::Args;
use std::fmt;
use std::time::Duration;

use crate::auth::Credential;
use crate::config::host_port;
use crate::config::settings::{nonempty, DEFAULT_RPC_PORT};
use crate::utils::serde_helpers::redacted;
use crate::utils::ConfigError;

/// Settings for the `monitor` subcommand.
#[derive(Args, Clone, Default)]
pub struct MonitorArgs {
    /// remote node host being watched
    #[arg(long, env = "REMOTE_HOST")]
    pub remote_host: Option<String>,

    #[arg(long, env = "REMOTE_RPC_PORT")]
    pub remote_rpc_port: Option<String>,

    /// full RPC URL; overrides remote host and port
    #[arg(long, env = "MONITOR_RPC_URL")]
    pub rpc_url: Option<String>,

    #[arg(long, env = "RPC_USERNAME")]
    pub rpc_username: Option<String>,

    #[arg(long, env = "RPC_PASSWORD", hide_env_values = true)]
    pub rpc_password: Option<String>,

    /// status collector host
    #[arg(long, env = "DBX_HOST")]
    pub dbx_host: Option<String>,

    #[arg(long, env = "DBX_PORT")]
    pub dbx_port: Option<String>,

    #[arg(long, default_value_t = 10)]
    pub startup_delay_secs: u64,

    #[arg(long, default_value_t = 10)]
    pub interval_secs: u64,

    #[arg(long, default_value_t = 10)]
    pub poll_timeout_secs: u64,
}

impl fmt::Debug for MonitorArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorArgs")
            .field("remote_host", &self.remote_host)
            .field("remote_rpc_port", &self.remote_rpc_port)
            .field("rpc_url", &self.rpc_url)
            .field("rpc_username", &self.rpc_username)
            .field("rpc_password", &redacted(&self.rpc_password))
            .field("dbx_host", &self.dbx_host)
            .field("dbx_port", &self.dbx_port)
            .field("startup_delay_secs", &self.startup_delay_secs)
            .field("interval_secs", &self.interval_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

/// Resolved monitor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub remote_host: String,
    pub rpc_url: String,
    pub credential: Option<Credential>,
    pub metrics_url: String,
    pub startup_delay: Duration,
    pub interval: Duration,
    pub poll_timeout: Duration,
}

impl MonitorConfig {
    pub fn resolve(args: MonitorArgs) -> Result<Self, ConfigError> {
        let remote_host = nonempty(args.remote_host).ok_or(ConfigError::MissingField("remote-host"))?;
        let rpc_url = match nonempty(args.rpc_url) {
            Some(url) => url,
            None => {
                let port = match nonempty(args.remote_rpc_port) {
                    Some(p) => p.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        field: "remote-rpc-port",
                        reason: e.to_string(),
                    })?,
                    None => DEFAULT_RPC_PORT,
                };
                format!("http://{}", host_port(&remote_host, port))
            }
        };

        // the monitor only authenticates when both halves are present
        let credential = match (nonempty(args.rpc_username), nonempty(args.rpc_password)) {
            (Some(u), Some(p)) => Some(Credential::new(u, p)),
            _ => None,
        };

        let dbx_host = nonempty(args.dbx_host).ok_or(ConfigError::MissingField("dbx-host"))?;
        let dbx_port = nonempty(args.dbx_port).ok_or(ConfigError::MissingField("dbx-port"))?;
        let metrics_url = format!("http://{}:{}/dbx/metrics", dbx_host, dbx_port);

        if args.interval_secs == 0 {
            return Err(ConfigError::Invalid { field: "interval-secs", reason: "must be positive".into() });
        }

        Ok(Self {
            remote_host,
            rpc_url,
            credential,
            metrics_url,
            startup_delay: Duration::from_secs(args.startup_delay_secs),
            interval: Duration::from_secs(args.interval_secs),
            poll_timeout: Duration::from_secs(args.poll_timeout_secs),
        })
    }
}
