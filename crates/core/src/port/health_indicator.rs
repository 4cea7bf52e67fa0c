// Health Indicator Port
// Abstraction for named, reusable probes (system resources, dependencies)

use crate::domain::Outcome;
use thiserror::Error;

/// Indicator errors
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Resource unavailable: {0}")]
    Unavailable(String),
}

/// Health Indicator trait
///
/// Implementations:
/// - SystemResourceIndicator: memory / disk thresholds (infra-system)
/// - MockIndicator: scripted behavior for tests
///
/// `health` is synchronous and may block; the engine always calls it from
/// the blocking pool.
pub trait HealthIndicator: Send + Sync {
    /// Name used in log fields
    fn name(&self) -> &str;

    /// Produce the current health of the resource
    ///
    /// # Errors
    /// - IndicatorError::Unavailable if the resource cannot be inspected
    fn health(&self) -> Result<Outcome, IndicatorError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock indicator behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always UP
        Up,
        /// Always DOWN with the given error detail
        Down(String),
        /// Return an error
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Block for the given duration, then report UP
        Slow(Duration),
    }

    /// Mock HealthIndicator for testing
    pub struct MockIndicator {
        name: String,
        behavior: MockBehavior,
        call_count: AtomicUsize,
    }

    impl MockIndicator {
        pub fn new(name: impl Into<String>, behavior: MockBehavior) -> Self {
            Self {
                name: name.into(),
                behavior,
                call_count: AtomicUsize::new(0),
            }
        }
        pub fn new_up() -> Self {
            Self::new("mock", MockBehavior::Up)
        }
        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new("mock", MockBehavior::Fail(message.into()))
        }
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    impl HealthIndicator for MockIndicator {
        fn name(&self) -> &str {
            &self.name
        }

        fn health(&self) -> Result<Outcome, IndicatorError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            match &self.behavior {
                MockBehavior::Up => Ok(Outcome::up()),
                MockBehavior::Down(msg) => Ok(Outcome::down_with_error(msg.clone())),
                MockBehavior::Fail(msg) => Err(IndicatorError::Unavailable(msg.clone())),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::Slow(delay) => {
                    std::thread::sleep(*delay);
                    Ok(Outcome::up())
                }
            }
        }
    }
}
