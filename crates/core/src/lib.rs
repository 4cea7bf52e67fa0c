// Healthcheck Core - Outcome Model, Scheduler & Probe Runner
// NO infrastructure dependencies (ADR-001: Hexagonal Architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{
    AsyncHealthChecker, CheckHandle, EngineConfig, ShutdownPhase, ShutdownReport, TimeoutSurfacing,
};
pub use domain::{Outcome, Resolution, ResolutionCause, Status};
pub use error::{EngineError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
