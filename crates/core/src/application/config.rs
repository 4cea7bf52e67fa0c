// Engine Configuration
// Defaults live here; the composition root decides where overrides come from

use super::scheduler::constants::{
    DEFAULT_CONFIRM_GRACE_WINDOW, DEFAULT_DRAIN_GRACE_WINDOW, DEFAULT_WORKER_COUNT,
};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_WORKER_COUNT: &str = "HEALTHCHECK_WORKER_COUNT";
pub const ENV_DRAIN_GRACE_SECS: &str = "HEALTHCHECK_DRAIN_GRACE_SECS";
pub const ENV_CONFIRM_GRACE_SECS: &str = "HEALTHCHECK_CONFIRM_GRACE_SECS";
pub const ENV_TIMEOUT_SURFACING: &str = "HEALTHCHECK_TIMEOUT_SURFACING";

/// How a timed-out check is reported to the awaiting caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutSurfacing {
    /// Resolve to a DOWN outcome carrying the timeout message
    #[default]
    AsDownOutcome,
    /// Resolve to `EngineError::TimedOut`
    AsError,
}

impl FromStr for TimeoutSurfacing {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "as_down_outcome" | "down" => Ok(TimeoutSurfacing::AsDownOutcome),
            "as_error" | "error" => Ok(TimeoutSurfacing::AsError),
            other => Err(EngineError::Config(format!(
                "unknown timeout surfacing mode '{}'",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Probe workers; 1 serializes executions in submission order
    pub worker_count: usize,

    /// First drain window at shutdown
    #[serde(rename = "drain_grace_window_secs", with = "duration_secs")]
    pub drain_grace_window: Duration,

    /// Confirmation window after forced cancellation
    #[serde(rename = "confirm_grace_window_secs", with = "duration_secs")]
    pub confirm_grace_window: Duration,

    pub timeout_surfacing: TimeoutSurfacing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            drain_grace_window: DEFAULT_DRAIN_GRACE_WINDOW,
            confirm_grace_window: DEFAULT_CONFIRM_GRACE_WINDOW,
            timeout_surfacing: TimeoutSurfacing::AsDownOutcome,
        }
    }
}

impl EngineConfig {
    /// Load overrides from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load overrides through `lookup` (unset keys keep their defaults)
    ///
    /// # Example
    /// ```text
    /// HEALTHCHECK_WORKER_COUNT=4 HEALTHCHECK_TIMEOUT_SURFACING=as_error ./healthcheck
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_WORKER_COUNT) {
            config.worker_count = raw
                .trim()
                .parse()
                .map_err(|e| EngineError::Config(format!("{}: {}", ENV_WORKER_COUNT, e)))?;
        }
        if let Some(raw) = lookup(ENV_DRAIN_GRACE_SECS) {
            config.drain_grace_window = parse_secs(ENV_DRAIN_GRACE_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONFIRM_GRACE_SECS) {
            config.confirm_grace_window = parse_secs(ENV_CONFIRM_GRACE_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SURFACING) {
            config.timeout_surfacing = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(EngineError::Config(
                "worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|e| EngineError::Config(format!("{}: {}", key, e)))?;
    Duration::try_from_secs_f64(secs).map_err(|e| EngineError::Config(format!("{}: {}", key, e)))
}

/// Durations as (fractional) seconds in config files
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
