use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::utils::metrics::{
    RELAY_ACTIVE, RELAY_BYTES_TO_CLIENT, RELAY_BYTES_TO_UPSTREAM, RELAY_CONNECTIONS, RELAY_DIAL_FAILURES,
};
use crate::utils::{ProxyError, Result, METRICS};

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Copy `reader` into `writer` until end-of-stream or error, then half-close `writer`
/// so the peer sees EOF while the opposite direction keeps flowing.
pub async fn pump<R, W>(mut reader: R, mut writer: W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = tokio::io::copy(&mut reader, &mut writer).await;
    let closed = writer.shutdown().await;
    let n = copied?;
    // the peer may already have gone away; EOF was still delivered as far as we can
    if let Err(e) = closed {
        debug!("half-close after {} bytes failed: {:?}", n, e);
    }
    Ok(n)
}

/// Which side finished first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    ToUpstream,
    ToClient,
}

/// Outcome of one relayed connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub to_upstream: u64,
    pub to_client: u64,
    /// true if a read/write error (not a clean EOF) ended the connection
    pub failed: bool,
}

/// One client socket paired with one upstream socket for its whole lifetime.
pub struct RelayConnection {
    id: u64,
    peer: SocketAddr,
    client: TcpStream,
}

impl RelayConnection {
    pub fn new(client: TcpStream, peer: SocketAddr) -> Self {
        let id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
        Self { id, peer, client }
    }

    /// Dial the upstream and relay until both directions are done.
    ///
    /// A dial failure closes the client without relaying anything.
    pub async fn run(self, upstream_addr: &str, dial_timeout: Option<Duration>) -> Result<RelayStats> {
        METRICS.inc_counter(RELAY_CONNECTIONS);
        info!(conn = self.id, peer = %self.peer, "relay connection opened");

        let upstream = match dial(upstream_addr, dial_timeout).await {
            Ok(s) => s,
            Err(e) => {
                METRICS.inc_counter(RELAY_DIAL_FAILURES);
                warn!(conn = self.id, peer = %self.peer, error = %e, "relay upstream dial failed");
                return Err(e);
            }
        };

        METRICS.add_gauge(RELAY_ACTIVE, 1.0);
        let stats = relay(self.client, upstream).await;
        METRICS.add_gauge(RELAY_ACTIVE, -1.0);
        METRICS.add_counter(RELAY_BYTES_TO_UPSTREAM, stats.to_upstream);
        METRICS.add_counter(RELAY_BYTES_TO_CLIENT, stats.to_client);

        info!(
            conn = self.id,
            peer = %self.peer,
            to_upstream = stats.to_upstream,
            to_client = stats.to_client,
            failed = stats.failed,
            "relay connection closed"
        );
        Ok(stats)
    }
}

async fn dial(addr: &str, limit: Option<Duration>) -> Result<TcpStream> {
    bounded_connect(addr, limit, TcpStream::connect(addr)).await
}

/// Await a connect attempt under an optional deadline. An expired deadline is
/// reported like any other connect failure.
async fn bounded_connect<F, T>(addr: &str, limit: Option<Duration>, connect: F) -> Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    let res = match limit {
        Some(limit) => match tokio::time::timeout(limit, connect).await {
            Ok(res) => res,
            Err(_) => {
                return Err(ProxyError::UpstreamConnect {
                    addr: addr.to_string(),
                    reason: format!("timed out after {:?}", limit),
                })
            }
        },
        None => connect.await,
    };
    res.map_err(|e| ProxyError::UpstreamConnect { addr: addr.to_string(), reason: e.to_string() })
}

/// Run both directional copies as their own tasks and join them.
///
/// A clean EOF on one side only half-closes the other socket; the remaining
/// direction runs to its own end. A hard error on either side aborts the other
/// direction, dropping both sockets.
pub async fn relay(client: TcpStream, upstream: TcpStream) -> RelayStats {
    let _ = client.set_nodelay(true);
    let _ = upstream.set_nodelay(true);
    let (client_read, client_write) = client.into_split();
    let (upstream_read, upstream_write) = upstream.into_split();

    let mut to_upstream: JoinHandle<io::Result<u64>> = tokio::spawn(pump(client_read, upstream_write));
    let mut to_client: JoinHandle<io::Result<u64>> = tokio::spawn(pump(upstream_read, client_write));

    let (first_dir, first) = tokio::select! {
        res = &mut to_upstream => (Direction::ToUpstream, res),
        res = &mut to_client => (Direction::ToClient, res),
    };
    let remaining = match first_dir {
        Direction::ToUpstream => to_client,
        Direction::ToClient => to_upstream,
    };

    let first = flatten(first);
    if first.is_err() {
        remaining.abort();
    }
    let second = flatten(remaining.await);

    let (up, down) = match first_dir {
        Direction::ToUpstream => (first, second),
        Direction::ToClient => (second, first),
    };
    RelayStats {
        failed: up.is_err() || down.is_err(),
        to_upstream: up.unwrap_or(0),
        to_client: down.unwrap_or(0),
    }
}

fn flatten(res: std::result::Result<io::Result<u64>, tokio::task::JoinError>) -> io::Result<u64> {
    match res {
        Ok(inner) => inner,
        Err(e) if e.is_cancelled() => Err(io::Error::new(io::ErrorKind::Interrupted, "aborted")),
        Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
    }
}
