// AsyncHealthChecker - caller-facing facade over runner and lifecycle

use crate::application::config::EngineConfig;
use crate::application::lifecycle::{LifecycleManager, ShutdownReport};
use crate::application::runner::{CheckHandle, ProbeRunner};
use crate::application::scheduler::{Scheduler, SchedulerState};
use crate::domain::Outcome;
use crate::error::Result;
use crate::port::HealthIndicator;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs health checks off the calling thread with a timeout
///
/// # Example
/// ```text
/// let checker = AsyncHealthChecker::new(EngineConfig::default())?;
/// let outcome = checker.perform_check(|| db.ping(), Duration::from_secs(3))?.await?;
/// checker.shutdown().await;
/// ```
pub struct AsyncHealthChecker {
    config: EngineConfig,
    scheduler: Arc<Scheduler>,
    runner: ProbeRunner,
    lifecycle: LifecycleManager,
}

impl AsyncHealthChecker {
    /// Build the engine on the current tokio runtime
    ///
    /// # Errors
    /// - EngineError::Config for an invalid configuration
    /// - EngineError::Runtime if called outside a tokio runtime
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let scheduler = Arc::new(Scheduler::new(config.worker_count)?);
        let runner = ProbeRunner::new(Arc::clone(&scheduler), config.timeout_surfacing);
        let lifecycle = LifecycleManager::new(
            Arc::clone(&scheduler),
            config.drain_grace_window,
            config.confirm_grace_window,
        );

        info!(
            worker_count = config.worker_count,
            timeout_surfacing = ?config.timeout_surfacing,
            "Health checker ready"
        );

        Ok(Self {
            config,
            scheduler,
            runner,
            lifecycle,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Accepted checks that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.scheduler.in_flight()
    }

    /// Perform one health check bounded by `timeout`
    pub fn perform_check<P, E>(&self, probe: P, timeout: Duration) -> Result<CheckHandle>
    where
        P: FnOnce() -> std::result::Result<Outcome, E> + Send + 'static,
        E: Display + 'static,
    {
        self.runner.run(probe, timeout)
    }

    /// Perform one health check with a timeout in whole seconds
    pub fn perform_check_secs<P, E>(&self, probe: P, timeout_secs: i64) -> Result<CheckHandle>
    where
        P: FnOnce() -> std::result::Result<Outcome, E> + Send + 'static,
        E: Display + 'static,
    {
        self.runner.run_secs(probe, timeout_secs)
    }

    /// Perform one health check through a named indicator
    pub fn check_indicator(
        &self,
        indicator: Arc<dyn HealthIndicator>,
        timeout: Duration,
    ) -> Result<CheckHandle> {
        self.runner.run_indicator(indicator, timeout)
    }

    /// Stop accepting checks and drain in-flight ones (idempotent)
    pub async fn shutdown(&self) -> ShutdownReport {
        self.lifecycle.shutdown().await
    }
}
