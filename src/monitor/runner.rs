use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::monitor::args::MonitorConfig;
use crate::monitor::client::NodeClient;
use crate::monitor::sink::{HttpStatusSink, StatusSink};
use crate::monitor::status;
use crate::utils::{shutdown_requested, Result};

/// Periodic health poller for a remote node.
pub struct Monitor {
    cfg: MonitorConfig,
    client: NodeClient,
    sink: Arc<dyn StatusSink>,
}

impl Monitor {
    pub fn new(cfg: MonitorConfig, sink: Arc<dyn StatusSink>) -> Result<Self> {
        let client = NodeClient::new(&cfg.rpc_url, cfg.credential.as_ref(), cfg.poll_timeout)?;
        Ok(Self { cfg, client, sink })
    }

    pub fn from_config(cfg: MonitorConfig) -> Result<Self> {
        let sink = Arc::new(HttpStatusSink::new(cfg.metrics_url.clone())?);
        Self::new(cfg, sink)
    }

    /// Poll once and submit the resulting document. Submission failures are logged only.
    pub async fn tick(&self) {
        let doc = match self.client.blockchain_info().await {
            Ok(info) => {
                info!(
                    remote = %self.cfg.remote_host,
                    chain = %info.chain,
                    blocks = info.blocks,
                    headers = info.headers,
                    progress = info.verification_progress,
                    ibd = info.initial_block_download,
                    "node status"
                );
                status::connected(&self.cfg.remote_host, &info)
            }
            Err(e) => {
                warn!(remote = %self.cfg.remote_host, error = %e, "failed to get blockchain info");
                status::disconnected(&self.cfg.remote_host)
            }
        };

        match self.sink.submit(&doc).await {
            Ok(()) => info!("status submitted"),
            Err(e) => warn!(error = %e, "status submission failed"),
        }
    }

    /// Wait out the startup delay, then tick every interval until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("monitoring {} via {}", self.cfg.remote_host, self.client.url());

        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => return Ok(()),
            _ = sleep(self.cfg.startup_delay) => {}
        }

        // first poll one interval after startup, like a plain ticker
        let mut ticker = interval_at(Instant::now() + self.cfg.interval, self.cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => {
                    info!("monitor shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }
}
