use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::ProxyConfig;
use crate::relay::connection::RelayConnection;
use crate::utils::{shutdown_requested, ConnectionSlots, ProxyError, Result};

/// Raw TCP listener. Every accepted client gets its own upstream connection.
pub struct RelayListener {
    listener: TcpListener,
    upstream: Arc<str>,
    dial_timeout: Option<Duration>,
    slots: ConnectionSlots,
}

impl RelayListener {
    /// Bind the listener. Failure here is fatal for the process.
    pub async fn bind(addr: &str, upstream: &str, dial_timeout: Option<Duration>, slots: ConnectionSlots) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ProxyError::Bind {
            protocol: "relay",
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self::from_listener(listener, upstream, dial_timeout, slots))
    }

    pub async fn from_config(cfg: &ProxyConfig) -> Result<Self> {
        Self::bind(
            &cfg.relay_listen_addr(),
            &cfg.relay_upstream_addr,
            cfg.limits.upstream_timeout,
            ConnectionSlots::new(cfg.limits.max_connections),
        )
        .await
    }

    pub fn from_listener(listener: TcpListener, upstream: &str, dial_timeout: Option<Duration>, slots: ConnectionSlots) -> Self {
        Self { listener, upstream: Arc::from(upstream), dial_timeout, slots }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Accept loop. Runs until shutdown is signalled; accept and dial errors
    /// never stop the listener.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("relay listening on {} -> {}", self.local_addr()?, self.upstream);

        loop {
            let next = async {
                let permit = self.slots.acquire().await;
                (permit, self.listener.accept().await)
            };
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => {
                    info!("relay listener shutting down");
                    return Ok(());
                }
                (permit, accepted) = next => match accepted {
                    Ok((stream, peer)) => {
                        let conn = RelayConnection::new(stream, peer);
                        let upstream = self.upstream.clone();
                        let dial_timeout = self.dial_timeout;
                        tokio::spawn(async move {
                            // failures are already logged and counted by the connection
                            let _ = conn.run(&upstream, dial_timeout).await;
                            drop(permit);
                        });
                    }
                    Err(e) => {
                        warn!("relay accept failed: {:?}", e);
                        sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }
    }
}
