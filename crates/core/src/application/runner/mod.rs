//! Probe Runner - one probe execution raced against one timeout
//!
//! The probe runs on the scheduler's worker pool while a timeout watcher is
//! armed on its timer context. Both write into the same `OutcomeSlot`; the
//! first write is the execution's only resolution.

mod handle;
mod slot;

pub use handle::CheckHandle;
pub use slot::OutcomeSlot;

use crate::application::config::TimeoutSurfacing;
use crate::application::scheduler::constants::{
    HEALTH_CHECK_CANCELLED_MESSAGE, HEALTH_CHECK_FAILED_MESSAGE, HEALTH_CHECK_TIMEOUT_MESSAGE,
};
use crate::application::scheduler::{millis, Fire, Scheduler};
use crate::domain::{Outcome, Resolution, ResolutionCause};
use crate::error::Result;
use crate::port::HealthIndicator;
use std::fmt::Display;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Turns a probe plus a timeout into exactly one resolution
pub struct ProbeRunner {
    scheduler: Arc<Scheduler>,
    surfacing: TimeoutSurfacing,
}

impl ProbeRunner {
    pub fn new(scheduler: Arc<Scheduler>, surfacing: TimeoutSurfacing) -> Self {
        Self {
            scheduler,
            surfacing,
        }
    }

    /// Run `probe` off the calling thread, bounded by `timeout`
    ///
    /// Returns immediately; the handle resolves to the probe's outcome, a DOWN
    /// outcome for a failure or panic, or a timeout resolution if the watcher
    /// fires first. A zero timeout is accepted and fires at the next opportunity.
    ///
    /// # Errors
    /// - EngineError::Rejected if the scheduler no longer accepts work; the
    ///   probe is never started in that case
    pub fn run<P, E>(&self, probe: P, timeout: Duration) -> Result<CheckHandle>
    where
        P: FnOnce() -> std::result::Result<Outcome, E> + Send + 'static,
        E: Display + 'static,
    {
        self.scheduler.ensure_accepting()?;

        let check_id = Uuid::new_v4();
        let timeout_ms = millis(timeout);
        let (slot, rx) = OutcomeSlot::new();

        // Armed first so a rejected probe submission can take it back
        let watcher_slot = Arc::clone(&slot);
        let watcher = self.scheduler.submit_delayed(timeout, move |fire| match fire {
            Fire::Elapsed => {
                if !watcher_slot.is_resolved()
                    && watcher_slot.resolve(Resolution::timed_out(HEALTH_CHECK_TIMEOUT_MESSAGE))
                {
                    warn!(%check_id, timeout_ms, "{}", HEALTH_CHECK_TIMEOUT_MESSAGE);
                }
            }
            Fire::Cancelled => {
                if watcher_slot.resolve(Resolution::cancelled(HEALTH_CHECK_CANCELLED_MESSAGE)) {
                    warn!(%check_id, "Health check cancelled by forced shutdown");
                }
            }
        })?;
        let watcher_canceller = watcher.canceller();

        let probe_slot = Arc::clone(&slot);
        let submitted = self.scheduler.submit(move || {
            let resolution = evaluate(probe);
            let cause = resolution.cause();
            let message = resolution.outcome().error_message().map(str::to_owned);

            if !probe_slot.resolve(resolution) {
                debug!(%check_id, "Late probe result discarded");
                return;
            }
            if let Some(canceller) = &watcher_canceller {
                canceller.cancel();
            }
            match cause {
                ResolutionCause::ProbeFailed => error!(
                    %check_id,
                    error = message.as_deref().unwrap_or_default(),
                    "{}", HEALTH_CHECK_FAILED_MESSAGE
                ),
                _ => debug!(%check_id, "Health check completed"),
            }
        });

        if let Err(e) = submitted {
            watcher.cancel();
            return Err(e);
        }

        debug!(%check_id, timeout_ms, "Health check submitted");
        Ok(CheckHandle::new(check_id, timeout, self.surfacing, rx))
    }

    /// Seconds-based variant of [`ProbeRunner::run`]; negative values count as zero
    pub fn run_secs<P, E>(&self, probe: P, timeout_secs: i64) -> Result<CheckHandle>
    where
        P: FnOnce() -> std::result::Result<Outcome, E> + Send + 'static,
        E: Display + 'static,
    {
        let timeout = Duration::from_secs(timeout_secs.max(0) as u64);
        self.run(probe, timeout)
    }

    /// Run a named indicator as a probe
    pub fn run_indicator(
        &self,
        indicator: Arc<dyn HealthIndicator>,
        timeout: Duration,
    ) -> Result<CheckHandle> {
        debug!(indicator = indicator.name(), "Running health indicator");
        self.run(move || indicator.health(), timeout)
    }
}

/// Call the probe once, mapping errors and panics to a failed resolution
fn evaluate<P, E>(probe: P) -> Resolution
where
    P: FnOnce() -> std::result::Result<Outcome, E>,
    E: Display,
{
    match catch_unwind(AssertUnwindSafe(probe)) {
        Ok(Ok(outcome)) => Resolution::completed(outcome),
        Ok(Err(e)) => Resolution::probe_failed(e.to_string()),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(panic_msg = %message, "Probe panicked");
            Resolution::probe_failed(format!("probe panicked: {}", message))
        }
    }
}

/// Text of a panic payload (`panic!` yields `&str` or `String`)
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
