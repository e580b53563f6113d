use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, OwnedSemaphorePermit};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::rpc::proxy::RpcProxy;
use crate::utils::{shutdown_requested, ConnectionSlots, ProxyError, Result};

/// RpcServer owns the bound HTTP listener and serves every connection with `RpcProxy`.
pub struct RpcServer {
    listener: TcpListener,
    proxy: RpcProxy,
    slots: ConnectionSlots,
}

impl RpcServer {
    /// Bind the listener. Failure here is fatal for the process.
    pub async fn bind(addr: &str, proxy: RpcProxy, slots: ConnectionSlots) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ProxyError::Bind {
            protocol: "rpc",
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self::from_listener(listener, proxy, slots))
    }

    pub fn from_listener(listener: TcpListener, proxy: RpcProxy, slots: ConnectionSlots) -> Self {
        Self { listener, proxy, slots }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop. Runs until shutdown is signalled; accept errors are logged and skipped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "RPC proxy listening on {} -> {} (auth {})",
            self.local_addr()?,
            self.proxy.upstream(),
            if self.proxy.auth_enabled() { "enabled" } else { "disabled" }
        );

        loop {
            let next = async {
                let permit = self.slots.acquire().await;
                (permit, self.listener.accept().await)
            };
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => {
                    info!("rpc listener shutting down");
                    return Ok(());
                }
                (permit, accepted) = next => match accepted {
                    Ok((stream, remote)) => serve_connection(stream, remote, self.proxy.clone(), permit),
                    Err(e) => {
                        warn!("rpc accept failed: {:?}", e);
                        sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }
    }
}

fn serve_connection(stream: TcpStream, remote: SocketAddr, proxy: RpcProxy, permit: Option<OwnedSemaphorePermit>) {
    debug!("rpc connection from {}", remote);
    let io = TokioIo::new(stream);

    tokio::spawn(async move {
        let svc = service_fn(move |req| {
            let proxy = proxy.clone();
            async move { Ok::<_, Infallible>(proxy.handle(req, remote).await) }
        });
        // a mid-body upstream failure surfaces here as a truncated response
        if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
            debug!(remote = %remote, error = ?err, "rpc connection closed with error");
        }
        drop(permit);
    });
}
