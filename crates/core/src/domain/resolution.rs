// Resolution - the value written into an outcome slot

use super::outcome::Outcome;
use serde::{Deserialize, Serialize};

/// Which path resolved a probe execution
///
/// `ProbeFailed` and `TimedOut` are mutually exclusive: a timed-out
/// execution is never also reported as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionCause {
    /// The probe returned an outcome (UP or DOWN) on its own
    Completed,
    /// The probe returned an error or panicked
    ProbeFailed,
    /// The timeout watcher fired first
    TimedOut,
    /// Forced shutdown discarded the execution
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    cause: ResolutionCause,
    outcome: Outcome,
}

impl Resolution {
    pub fn new(cause: ResolutionCause, outcome: Outcome) -> Self {
        Self { cause, outcome }
    }

    pub fn completed(outcome: Outcome) -> Self {
        Self::new(ResolutionCause::Completed, outcome)
    }

    pub fn probe_failed(message: impl Into<String>) -> Self {
        Self::new(ResolutionCause::ProbeFailed, Outcome::down_with_error(message))
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(ResolutionCause::TimedOut, Outcome::down_with_error(message))
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ResolutionCause::Cancelled, Outcome::down_with_error(message))
    }

    pub fn cause(&self) -> ResolutionCause {
        self.cause
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    pub fn is_timed_out(&self) -> bool {
        self.cause == ResolutionCause::TimedOut
    }
}
