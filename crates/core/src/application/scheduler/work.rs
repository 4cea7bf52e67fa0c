// Work units, in-flight accounting and the handles returned to submitters

use crate::error::{EngineError, Result};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::AbortHandle;

/// Why a delayed action ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fire {
    /// The requested delay elapsed
    Elapsed,
    /// Forced cancellation cut the wait short
    Cancelled,
}

/// Counts accepted work that has not finished yet
pub(crate) struct InFlight {
    tx: watch::Sender<usize>,
}

impl InFlight {
    pub(crate) fn new() -> Arc<Self> {
        let (tx, _rx) = watch::channel(0);
        Arc::new(Self { tx })
    }

    /// Register one unit of work; it stays in flight until the guard drops
    pub(crate) fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.tx.send_modify(|n| *n += 1);
        InFlightGuard {
            tracker: Arc::clone(self),
        }
    }

    pub(crate) fn count(&self) -> usize {
        *self.tx.borrow()
    }

    /// Resolves once no accepted work remains
    pub(crate) async fn wait_idle(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

pub(crate) struct InFlightGuard {
    tracker: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.tx.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// A queued unit of work for the worker pool
pub(crate) struct Job {
    body: Box<dyn FnOnce() + Send + 'static>,
    guard: InFlightGuard,
}

impl Job {
    pub(crate) fn new(guard: InFlightGuard, body: impl FnOnce() + Send + 'static) -> Self {
        Self {
            body: Box::new(body),
            guard,
        }
    }

    pub(crate) fn run(self) {
        let Job { body, guard } = self;
        body();
        drop(guard);
    }
}

/// Cancels delayed work that has not fired yet
#[derive(Clone)]
pub struct Canceller {
    abort: AbortHandle,
}

impl Canceller {
    pub(crate) fn new(abort: AbortHandle) -> Self {
        Self { abort }
    }

    /// No-op once the work has started or finished
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

/// Handle to submitted work
///
/// Dropping the handle does not cancel the work.
pub struct WorkHandle<T> {
    rx: oneshot::Receiver<T>,
    canceller: Option<Canceller>,
}

impl<T> WorkHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<T>, canceller: Option<Canceller>) -> Self {
        Self { rx, canceller }
    }

    /// Canceller for delayed work; queued work cannot be cancelled
    pub fn canceller(&self) -> Option<Canceller> {
        self.canceller.clone()
    }

    /// Cancel delayed work that has not fired yet. Returns false for queued work.
    pub fn cancel(&self) -> bool {
        match &self.canceller {
            Some(canceller) => {
                canceller.cancel();
                true
            }
            None => false,
        }
    }

    /// Wait for the work's value
    ///
    /// # Errors
    /// - EngineError::Cancelled if the work was discarded, cancelled or panicked
    pub async fn join(self) -> Result<T> {
        self.rx.await.map_err(|_| EngineError::Cancelled)
    }
}
