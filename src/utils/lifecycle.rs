use std::sync::Arc;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};

/// Optional ceiling on concurrently served connections for one listener.
/// Unlimited when built from `None`.
#[derive(Clone, Debug, Default)]
pub struct ConnectionSlots {
    sem: Option<Arc<Semaphore>>,
}

impl ConnectionSlots {
    pub fn new(max: Option<usize>) -> Self {
        Self { sem: max.map(|n| Arc::new(Semaphore::new(n))) }
    }

    pub fn unlimited() -> Self {
        Self { sem: None }
    }

    /// Wait for a free slot. The permit is held for the life of the connection;
    /// `None` means no ceiling is configured.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.sem {
            // the semaphore is never closed, so this only fails if that changes
            Some(sem) => sem.clone().acquire_owned().await.ok(),
            None => None,
        }
    }
}

/// Resolve once shutdown has been signalled or the sender is gone.
pub async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
