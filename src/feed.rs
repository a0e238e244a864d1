//! Periodic snapshot push feed
//!
//! Broadcasts the complete aggregate to subscribers on a fixed interval, so
//! consumers that missed individual events still converge on current state.
//! New subscribers get an immediate snapshot rather than waiting a full tick.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::state::{CompleteState, SessionStore};

pub struct SnapshotFeed {
    store: SessionStore,
    tx: broadcast::Sender<CompleteState>,
}

impl SnapshotFeed {
    pub fn new(store: SessionStore) -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { store, tx }
    }

    /// Subscribe, receiving the current snapshot up front
    pub fn subscribe(&self) -> (CompleteState, broadcast::Receiver<CompleteState>) {
        (self.store.complete_state(), self.tx.subscribe())
    }

    /// Start the periodic broadcast task
    pub fn spawn(&self, interval_ms: u64) -> JoinHandle<()> {
        let store = self.store.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
            loop {
                ticker.tick().await;
                if tx.receiver_count() == 0 {
                    continue;
                }
                let snapshot = store.complete_state();
                debug!(
                    "Pushing snapshot to {} subscriber(s)",
                    tx.receiver_count()
                );
                let _ = tx.send(snapshot);
            }
        })
    }
}
