//! Scheduler - the only background execution context of the engine
//!
//! - Worker pool: `worker_count` tasks pulling jobs from one FIFO queue;
//!   each job body runs on the blocking pool so probes may block
//! - Timer context: delayed work runs on its own tokio task and never waits
//!   behind a busy worker
//! - Drain: stop accepting, wait a bounded window, then force cancellation

pub mod cancel;
pub mod constants;
mod work;

pub use cancel::{CancelSender, CancelToken};
pub use work::{Canceller, Fire, WorkHandle};

use crate::error::{EngineError, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use work::{InFlight, Job};

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Accepts new submissions
    Running,
    /// Rejects new submissions, accepted work may finish
    Draining,
    /// Rejects everything, no worker task remains
    Terminated,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Running => write!(f, "RUNNING"),
            SchedulerState::Draining => write!(f, "DRAINING"),
            SchedulerState::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// Result of one drain request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Forced cancellation was needed because work outlived the window
    pub forced: bool,
    /// Accepted work still unfinished when the report was taken
    pub outstanding: usize,
    pub state: SchedulerState,
}

struct Inner {
    state: SchedulerState,
    queue_tx: Option<mpsc::UnboundedSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

/// Owned pool of probe workers plus a timer context
pub struct Scheduler {
    inner: Mutex<Inner>,
    in_flight: Arc<InFlight>,
    cancel: CancelSender,
    runtime: Handle,
    worker_count: usize,
}

impl Scheduler {
    /// Start a scheduler on the current tokio runtime
    ///
    /// # Errors
    /// - EngineError::Config if `worker_count` is zero
    /// - EngineError::Runtime if called outside a tokio runtime
    pub fn new(worker_count: usize) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| EngineError::Runtime(e.to_string()))?;
        Self::with_handle(runtime, worker_count)
    }

    /// Start a scheduler whose workers and timers live on `runtime`
    pub fn with_handle(runtime: Handle, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(EngineError::Config(
                "worker_count must be at least 1".to_string(),
            ));
        }

        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<Job>();
        // Only the workers hold the receiver: aborting them discards queued jobs
        let queue_rx = Arc::new(AsyncMutex::new(queue_rx));
        let workers = (0..worker_count)
            .map(|worker| runtime.spawn(run_worker(worker, Arc::clone(&queue_rx))))
            .collect();
        let cancel = CancelSender::new();

        info!(worker_count, "Scheduler started");

        Ok(Self {
            inner: Mutex::new(Inner {
                state: SchedulerState::Running,
                queue_tx: Some(queue_tx),
                workers,
            }),
            in_flight: InFlight::new(),
            cancel,
            runtime,
            worker_count,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.lock_inner().state
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Accepted work that has not finished (queued, running or waiting on a timer)
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Fail with `Rejected` unless the scheduler is running
    pub fn ensure_accepting(&self) -> Result<()> {
        match self.state() {
            SchedulerState::Running => Ok(()),
            state => Err(EngineError::Rejected(state)),
        }
    }

    /// Queue `work` for the worker pool
    ///
    /// # Errors
    /// - EngineError::Rejected if the scheduler is draining or terminated
    pub fn submit<F, T>(&self, work: F) -> Result<WorkHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.lock_inner();
        let queue_tx = match (inner.state, inner.queue_tx.as_ref()) {
            (SchedulerState::Running, Some(queue_tx)) => queue_tx,
            (state, _) => return Err(EngineError::Rejected(state)),
        };

        let (tx, rx) = oneshot::channel();
        let job = Job::new(self.in_flight.enter(), move || {
            let _ = tx.send(work());
        });

        // Fails only if every worker is gone; the returned job drops its guard
        queue_tx
            .send(job)
            .map_err(|_| EngineError::Rejected(SchedulerState::Terminated))?;

        Ok(WorkHandle::new(rx, None))
    }

    /// Run `work` once, no earlier than `delay` from now, on the timer context
    ///
    /// `work` receives `Fire::Cancelled` instead if forced cancellation happens
    /// first. It runs on an async task and must not block.
    ///
    /// # Errors
    /// - EngineError::Rejected if the scheduler is draining or terminated
    pub fn submit_delayed<F, T>(&self, delay: Duration, work: F) -> Result<WorkHandle<T>>
    where
        F: FnOnce(Fire) -> T + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.lock_inner();
        if inner.state != SchedulerState::Running {
            return Err(EngineError::Rejected(inner.state));
        }

        let guard = self.in_flight.enter();
        let mut cancel = self.cancel.token();
        let (tx, rx) = oneshot::channel();

        let timer = self.runtime.spawn(async move {
            let _guard = guard;
            let fire = tokio::select! {
                biased;
                _ = cancel.cancelled() => Fire::Cancelled,
                _ = tokio::time::sleep(delay) => Fire::Elapsed,
            };
            let _ = tx.send(work(fire));
        });
        drop(inner);

        Ok(WorkHandle::new(rx, Some(Canceller::new(timer.abort_handle()))))
    }

    /// Stop accepting work and wait up to `grace` for accepted work to finish
    ///
    /// If work remains after the window, workers are aborted, queued jobs are
    /// discarded and pending timers fire with `Fire::Cancelled`. Calling this
    /// again after termination re-checks that outstanding work reached zero.
    pub async fn request_drain(&self, grace: Duration) -> DrainReport {
        {
            let mut inner = self.lock_inner();
            if inner.state == SchedulerState::Running {
                inner.state = SchedulerState::Draining;
                // Closing the queue lets idle workers exit once it is empty
                inner.queue_tx = None;
                info!(
                    grace_ms = millis(grace),
                    in_flight = self.in_flight.count(),
                    "Scheduler draining"
                );
            }
        }

        if tokio::time::timeout(grace, self.in_flight.wait_idle())
            .await
            .is_ok()
        {
            let workers = {
                let mut inner = self.lock_inner();
                inner.state = SchedulerState::Terminated;
                std::mem::take(&mut inner.workers)
            };
            for worker in workers {
                worker.abort();
            }
            debug!("Scheduler drained");
            return DrainReport {
                forced: false,
                outstanding: 0,
                state: SchedulerState::Terminated,
            };
        }

        let outstanding = self.force_cancel();
        warn!(
            outstanding,
            grace_ms = millis(grace),
            "Drain window elapsed with work outstanding, forcing cancellation"
        );
        DrainReport {
            forced: true,
            outstanding,
            state: SchedulerState::Terminated,
        }
    }

    /// Abort workers and signal timers; returns the work still unfinished
    fn force_cancel(&self) -> usize {
        let workers = {
            let mut inner = self.lock_inner();
            inner.state = SchedulerState::Terminated;
            inner.queue_tx = None;
            std::mem::take(&mut inner.workers)
        };
        self.cancel.cancel();
        for worker in workers {
            worker.abort();
        }
        self.in_flight.count()
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if inner.state != SchedulerState::Terminated {
            inner.state = SchedulerState::Terminated;
            inner.queue_tx = None;
            for worker in inner.workers.drain(..) {
                worker.abort();
            }
            self.cancel.cancel();
            debug!("Scheduler dropped without drain, remaining work cancelled");
        }
    }
}

/// Milliseconds for log fields, saturating for very long durations
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Worker loop: one job at a time until the queue closes or the task is aborted
async fn run_worker(worker: usize, queue: Arc<AsyncMutex<mpsc::UnboundedReceiver<Job>>>) {
    debug!(worker, "Scheduler worker started");
    loop {
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(job) = next else {
            break;
        };

        if let Err(join_err) = tokio::task::spawn_blocking(move || job.run()).await {
            if join_err.is_panic() {
                error!(worker, "Scheduled work panicked: {:?}", join_err);
            } else {
                warn!(worker, "Scheduled work cancelled: {:?}", join_err);
            }
        }
    }
    debug!(worker, "Scheduler worker stopped");
}
