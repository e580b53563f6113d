use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::utils::Result;

/// Holds the running listener tasks and the shutdown channel they observe.
/// Call `shutdown()` to stop every listener and wait for it.
pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: JoinSet<(&'static str, Result<()>)>,
}

impl ServiceHandle {
    /// Create a new ServiceHandle and return it together with a Receiver clonable by tasks.
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (ServiceHandle { shutdown_tx: tx, tasks: JoinSet::new() }, rx)
    }

    /// Spawn a named listener task under this handle.
    pub fn spawn<F>(&mut self, name: &'static str, fut: F)
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks.spawn(async move { (name, fut.await) });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait until any task ends on its own. Pending forever when nothing is attached.
    pub async fn wait_any(&mut self) {
        match self.tasks.join_next().await {
            Some(joined) => log_exit(joined),
            None => std::future::pending::<()>().await,
        }
    }

    /// Signal shutdown to all tasks and wait for each of them.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        while let Some(joined) = self.tasks.join_next().await {
            log_exit(joined);
        }
    }
}

fn log_exit(joined: std::result::Result<(&'static str, Result<()>), tokio::task::JoinError>) {
    match joined {
        Ok((name, Ok(()))) => info!("{} listener stopped", name),
        Ok((name, Err(e))) => error!("{} listener returned error: {}", name, e),
        Err(e) => error!("listener task join error: {:?}", e),
    }
}
