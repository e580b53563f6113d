//! Listener manager: bind the enabled listeners for the configured role,
//! then run them side by side under one `ServiceHandle`.

use std::net::SocketAddr;
use tracing::info;

use crate::config::ProxyConfig;
use crate::gateway::service_handle::ServiceHandle;
use crate::relay::RelayListener;
use crate::rpc::{RpcProxy, RpcServer};
use crate::utils::{ConnectionSlots, Result};

/// Main gateway object
pub struct Gateway {
    cfg: ProxyConfig,
}

/// A started gateway: where it listens and how to stop it.
pub struct RunningGateway {
    pub rpc_addr: Option<SocketAddr>,
    pub relay_addr: Option<SocketAddr>,
    pub handle: ServiceHandle,
}

impl Gateway {
    pub fn new(cfg: ProxyConfig) -> Self {
        Self { cfg }
    }

    /// Bind every enabled listener, then spawn them.
    ///
    /// Binding happens before anything is spawned, so a port conflict on either
    /// listener fails the whole start and nothing is left serving.
    pub async fn start(self) -> Result<RunningGateway> {
        let cfg = self.cfg;
        cfg.validate()?;

        info!(
            "starting {} proxy (rpc {}, relay {}, auth {})",
            cfg.role,
            if cfg.rpc_enabled { "enabled" } else { "disabled" },
            if cfg.relay_enabled { "enabled" } else { "disabled" },
            if cfg.auth_enabled { "enabled" } else { "disabled" },
        );

        let rpc = if cfg.rpc_enabled {
            let proxy = RpcProxy::from_config(&cfg)?;
            let slots = ConnectionSlots::new(cfg.limits.max_connections);
            Some(RpcServer::bind(&cfg.rpc_listen_addr(), proxy, slots).await?)
        } else {
            None
        };
        let relay = if cfg.relay_enabled {
            Some(RelayListener::from_config(&cfg).await?)
        } else {
            None
        };

        let (mut handle, shutdown_rx) = ServiceHandle::new();
        let mut rpc_addr = None;
        let mut relay_addr = None;

        if let Some(server) = rpc {
            rpc_addr = Some(server.local_addr()?);
            handle.spawn("rpc", server.run(shutdown_rx.clone()));
        }
        if let Some(listener) = relay {
            relay_addr = Some(listener.local_addr()?);
            handle.spawn("relay", listener.run(shutdown_rx.clone()));
        }

        Ok(RunningGateway { rpc_addr, relay_addr, handle })
    }
}
