// Outcome Slot - resolve-once cell shared by the probe and its timeout watcher

use crate::domain::Resolution;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// First writer wins; later writes are silently discarded
pub struct OutcomeSlot {
    claimed: AtomicBool,
    tx: Mutex<Option<oneshot::Sender<Resolution>>>,
}

impl OutcomeSlot {
    /// Create a slot and the receiver its single resolution is delivered to
    pub fn new() -> (Arc<Self>, oneshot::Receiver<Resolution>) {
        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(Self {
            claimed: AtomicBool::new(false),
            tx: Mutex::new(Some(tx)),
        });
        (slot, rx)
    }

    pub fn is_resolved(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Try to commit `resolution`; returns false if another writer got there first
    pub fn resolve(&self, resolution: Resolution) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            // The caller may have dropped its handle; the claim still stands
            let _ = tx.send(resolution);
        }
        true
    }
}
