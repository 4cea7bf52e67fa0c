// Healthcheck Infrastructure - System Adapters
// Implements: HealthIndicator over host resources (ADR-002)

pub mod system_resource;

pub use system_resource::{ResourceSample, ResourceThresholds, SystemResourceIndicator};
