// Application Layer - Scheduler, Probe Runner and Lifecycle

pub mod checker;
pub mod config;
pub mod lifecycle;
pub mod runner;
pub mod scheduler;

// Re-exports
pub use checker::AsyncHealthChecker;
pub use config::{EngineConfig, TimeoutSurfacing};
pub use lifecycle::{LifecycleManager, ShutdownPhase, ShutdownReport};
pub use runner::{CheckHandle, OutcomeSlot, ProbeRunner};
pub use scheduler::{DrainReport, Fire, Scheduler, SchedulerState, WorkHandle};
