//! Progress publication.

use tokio::sync::watch;

use crate::models::BatchProgress;

/// Holds the live `BatchProgress` and notifies subscribers on every change.
#[derive(Debug)]
pub struct ProgressModel {
    tx: watch::Sender<BatchProgress>,
}

impl ProgressModel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BatchProgress::default());
        Self { tx }
    }

    /// Receiver that always sees the newest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.tx.subscribe()
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> BatchProgress {
        self.tx.borrow().clone()
    }

    /// Mutate the snapshot in place and notify subscribers.
    pub fn update(&self, modify: impl FnOnce(&mut BatchProgress)) {
        self.tx.send_modify(modify);
    }

    /// Replace the snapshot wholesale.
    pub fn replace(&self, progress: BatchProgress) {
        self.tx.send_replace(progress);
    }
}

impl Default for ProgressModel {
    fn default() -> Self {
        Self::new()
    }
}
