// Port Layer - Interfaces for probe providers

pub mod health_indicator;

// Re-exports
pub use health_indicator::{mocks, HealthIndicator, IndicatorError};
