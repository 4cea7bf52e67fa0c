// Central Error Type for the Engine

use crate::application::scheduler::SchedulerState;
use std::time::Duration;
use thiserror::Error;

/// Engine-level error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Submission attempted while the scheduler is not running
    #[error("Rejected: scheduler is {0}")]
    Rejected(SchedulerState),

    /// The probe itself failed or panicked
    #[error("Health check failed: {0}")]
    ProbeFailed(String),

    /// The timeout watcher fired before the probe resolved
    #[error("Health check timed out after {0:?}")]
    TimedOut(Duration),

    /// Drain window elapsed with work still outstanding
    #[error("Shutdown incomplete: {0} task(s) still outstanding")]
    ShutdownIncomplete(usize),

    /// Accepted work was discarded before it produced a value
    #[error("Work cancelled before completion")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl EngineError {
    /// True for errors caused by the scheduler refusing new work
    pub fn is_rejected(&self) -> bool {
        matches!(self, EngineError::Rejected(_))
    }
}

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
