// Lifecycle Manager - two-phase, idempotent scheduler shutdown

use crate::application::scheduler::Scheduler;
use crate::error::EngineError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

/// Which shutdown phase was needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// All accepted work finished inside the first window
    Graceful,
    /// Forced cancellation was needed; the confirmation drain found nothing left
    Forced,
    /// Work was still outstanding after the confirmation drain
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub phase: ShutdownPhase,
    pub outstanding: usize,
}

/// Owns scheduler teardown
pub struct LifecycleManager {
    scheduler: Arc<Scheduler>,
    drain_grace_window: Duration,
    confirm_grace_window: Duration,
    report: OnceCell<ShutdownReport>,
}

impl LifecycleManager {
    pub fn new(
        scheduler: Arc<Scheduler>,
        drain_grace_window: Duration,
        confirm_grace_window: Duration,
    ) -> Self {
        Self {
            scheduler,
            drain_grace_window,
            confirm_grace_window,
            report: OnceCell::new(),
        }
    }

    /// Drain the scheduler, escalating to forced cancellation if needed
    ///
    /// Safe to call repeatedly or concurrently: every caller gets the report
    /// of the single shutdown that actually ran.
    pub async fn shutdown(&self) -> ShutdownReport {
        *self.report.get_or_init(|| self.drain_in_phases()).await
    }

    pub fn is_shut_down(&self) -> bool {
        self.report.initialized()
    }

    async fn drain_in_phases(&self) -> ShutdownReport {
        let first = self.scheduler.request_drain(self.drain_grace_window).await;
        if !first.forced {
            info!("Health check executor shut down gracefully");
            return ShutdownReport {
                phase: ShutdownPhase::Graceful,
                outstanding: 0,
            };
        }

        warn!(
            outstanding = first.outstanding,
            "Health check executor did not terminate in time"
        );

        let confirm = self.scheduler.request_drain(self.confirm_grace_window).await;
        if !confirm.forced {
            info!("Health check executor terminated after forced cancellation");
            return ShutdownReport {
                phase: ShutdownPhase::Forced,
                outstanding: 0,
            };
        }

        error!(
            error = %EngineError::ShutdownIncomplete(confirm.outstanding),
            "Health check executor did not terminate"
        );
        ShutdownReport {
            phase: ShutdownPhase::Incomplete,
            outstanding: confirm.outstanding,
        }
    }
}
