// Check Handle - what the caller awaits for one probe execution

use crate::application::config::TimeoutSurfacing;
use crate::application::scheduler::constants::HEALTH_CHECK_CANCELLED_MESSAGE;
use crate::domain::{Outcome, Resolution, ResolutionCause};
use crate::error::{EngineError, Result};
use futures::future::{BoxFuture, FutureExt};
use std::future::IntoFuture;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Resolves exactly once to the execution's outcome
pub struct CheckHandle {
    check_id: Uuid,
    timeout: Duration,
    surfacing: TimeoutSurfacing,
    rx: oneshot::Receiver<Resolution>,
}

impl CheckHandle {
    pub(crate) fn new(
        check_id: Uuid,
        timeout: Duration,
        surfacing: TimeoutSurfacing,
        rx: oneshot::Receiver<Resolution>,
    ) -> Self {
        Self {
            check_id,
            timeout,
            surfacing,
            rx,
        }
    }

    /// Identifier carried in this execution's log fields
    pub fn check_id(&self) -> Uuid {
        self.check_id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Raw resolution including which path produced it
    ///
    /// If both writers vanished without resolving (runtime torn down), this
    /// yields a cancelled resolution instead of hanging.
    pub async fn resolution(self) -> Resolution {
        self.rx.await.unwrap_or_else(|_| abandoned())
    }

    /// Outcome with the configured timeout surfacing applied
    ///
    /// # Errors
    /// - EngineError::TimedOut if the watcher won and surfacing is `AsError`
    pub async fn outcome(self) -> Result<Outcome> {
        let (timeout, surfacing) = (self.timeout, self.surfacing);
        surface(self.resolution().await, surfacing, timeout)
    }

    /// Outcome only for a completed probe; every other cause is an error
    ///
    /// # Errors
    /// - EngineError::ProbeFailed with the failure message
    /// - EngineError::TimedOut regardless of the surfacing mode
    /// - EngineError::Cancelled if forced shutdown resolved the check
    pub async fn strict_outcome(self) -> Result<Outcome> {
        let timeout = self.timeout;
        let resolution = self.resolution().await;
        match resolution.cause() {
            ResolutionCause::Completed => Ok(resolution.into_outcome()),
            ResolutionCause::ProbeFailed => Err(EngineError::ProbeFailed(
                resolution
                    .outcome()
                    .error_message()
                    .unwrap_or_default()
                    .to_string(),
            )),
            ResolutionCause::TimedOut => Err(EngineError::TimedOut(timeout)),
            ResolutionCause::Cancelled => Err(EngineError::Cancelled),
        }
    }

    /// Blocking variant of [`CheckHandle::outcome`] for callers outside the runtime
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_outcome(self) -> Result<Outcome> {
        let resolution = self.rx.blocking_recv().unwrap_or_else(|_| abandoned());
        surface(resolution, self.surfacing, self.timeout)
    }
}

impl IntoFuture for CheckHandle {
    type Output = Result<Outcome>;
    type IntoFuture = BoxFuture<'static, Result<Outcome>>;

    fn into_future(self) -> Self::IntoFuture {
        self.outcome().boxed()
    }
}

fn abandoned() -> Resolution {
    Resolution::cancelled(HEALTH_CHECK_CANCELLED_MESSAGE)
}

fn surface(resolution: Resolution, surfacing: TimeoutSurfacing, timeout: Duration) -> Result<Outcome> {
    match (surfacing, resolution.cause()) {
        (TimeoutSurfacing::AsError, ResolutionCause::TimedOut) => Err(EngineError::TimedOut(timeout)),
        _ => Ok(resolution.into_outcome()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;

    fn handle(surfacing: TimeoutSurfacing) -> (oneshot::Sender<Resolution>, CheckHandle) {
        let (tx, rx) = oneshot::channel();
        let handle = CheckHandle::new(Uuid::new_v4(), Duration::from_secs(1), surfacing, rx);
        (tx, handle)
    }

    #[tokio::test]
    async fn test_timeout_as_down_outcome() {
        let (tx, handle) = handle(TimeoutSurfacing::AsDownOutcome);
        tx.send(Resolution::timed_out("Health check timed out")).unwrap();

        let outcome = handle.await.unwrap();
        assert_eq!(outcome.status(), Status::Down);
        assert_eq!(outcome.error_message(), Some("Health check timed out"));
    }

    #[tokio::test]
    async fn test_timeout_as_error() {
        let (tx, handle) = handle(TimeoutSurfacing::AsError);
        tx.send(Resolution::timed_out("Health check timed out")).unwrap();

        assert_eq!(handle.await, Err(EngineError::TimedOut(Duration::from_secs(1))));
    }

    #[tokio::test]
    async fn test_failure_is_never_surfaced_as_error() {
        let (tx, handle) = handle(TimeoutSurfacing::AsError);
        tx.send(Resolution::probe_failed("disk full")).unwrap();

        let outcome = handle.outcome().await.unwrap();
        assert_eq!(outcome.error_message(), Some("disk full"));
    }

    #[tokio::test]
    async fn test_strict_outcome_raises_every_non_completed_cause() {
        let (tx, failed) = handle(TimeoutSurfacing::AsDownOutcome);
        tx.send(Resolution::probe_failed("disk full")).unwrap();
        assert_eq!(
            failed.strict_outcome().await,
            Err(EngineError::ProbeFailed("disk full".to_string()))
        );

        let (tx, timed_out) = handle(TimeoutSurfacing::AsDownOutcome);
        tx.send(Resolution::timed_out("Health check timed out")).unwrap();
        assert_eq!(
            timed_out.strict_outcome().await,
            Err(EngineError::TimedOut(Duration::from_secs(1)))
        );

        let (tx, dropped) = handle(TimeoutSurfacing::AsDownOutcome);
        drop(tx);
        assert_eq!(dropped.strict_outcome().await, Err(EngineError::Cancelled));

        let (tx, completed) = handle(TimeoutSurfacing::AsDownOutcome);
        tx.send(Resolution::completed(Outcome::up())).unwrap();
        assert!(completed.strict_outcome().await.unwrap().is_up());
    }

    #[tokio::test]
    async fn test_abandoned_handle_resolves_cancelled() {
        let (tx, handle) = handle(TimeoutSurfacing::AsDownOutcome);
        drop(tx);

        let resolution = handle.resolution().await;
        assert_eq!(resolution.cause(), ResolutionCause::Cancelled);
        assert_eq!(resolution.outcome().status(), Status::Down);
    }

    #[test]
    fn test_blocking_outcome_outside_runtime() {
        let (tx, handle) = handle(TimeoutSurfacing::AsDownOutcome);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            let _ = tx.send(Resolution::completed(Outcome::up()));
        });

        assert!(handle.blocking_outcome().unwrap().is_up());
    }
}
