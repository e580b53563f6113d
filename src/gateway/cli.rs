use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::future::Future;
use tracing::{error, info};

use crate::config::{ProxyArgs, ProxyConfig};
use crate::gateway::{Gateway, ServiceHandle};
use crate::monitor::{Monitor, MonitorArgs, MonitorConfig};
use crate::utils::{init_logging, METRICS};

/// CLI for the Core proxy.
#[derive(Parser)]
#[command(name = "core-proxy", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Run the RPC and relay listeners for the configured role
    Run(ProxyArgs),
    /// Poll a remote node and report its status to the platform
    Monitor(MonitorArgs),
}

pub async fn run_cli() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Run(args) => run_proxy(args).await,
        Cmd::Monitor(args) => run_monitor(args).await,
    }
}

async fn run_proxy(args: ProxyArgs) -> Result<()> {
    let cfg = ProxyConfig::resolve(args.with_file_overlay()?)?;
    let running = Gateway::new(cfg).start().await?;

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
        }
        info!("shutting down proxy...");
    };
    let res = supervise(running.handle, ctrl_c).await;
    log_metrics();
    info!("proxy stopped");
    res
}

/// Serve until `stop` resolves or a listener ends on its own, then shut everything down.
/// A listener ending on its own is an error so the process exits non-zero.
async fn supervise<F>(mut handle: ServiceHandle, stop: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let listener_exited = tokio::select! {
        _ = stop => false,
        _ = handle.wait_any() => {
            error!("a listener exited unexpectedly, shutting down");
            true
        }
    };

    handle.shutdown().await;
    if listener_exited {
        return Err(anyhow!("listener exited unexpectedly"));
    }
    Ok(())
}

async fn run_monitor(args: MonitorArgs) -> Result<()> {
    let cfg = MonitorConfig::resolve(args)?;
    let monitor = Monitor::from_config(cfg)?;
    let (tx, rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(monitor.run(rx));

    tokio::signal::ctrl_c().await?;
    info!("shutting down monitor...");
    let _ = tx.send(true);
    task.await??;
    Ok(())
}

fn log_metrics() {
    let (counters, gauges) = METRICS.snapshot();
    let mut names: Vec<_> = counters.keys().collect();
    names.sort();
    for name in names {
        info!("{} {}", name, counters[name]);
    }
    let mut names: Vec<_> = gauges.keys().collect();
    names.sort();
    for name in names {
        info!("{} {}", name, gauges[name]);
    }
}
