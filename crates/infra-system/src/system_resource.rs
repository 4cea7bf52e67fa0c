// System resource indicator
// reason: sysinfo for cross-platform system monitoring (ADR-001)
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use sysinfo::{Disks, System};
use tracing::debug;

use healthcheck_core::port::{HealthIndicator, IndicatorError};
use healthcheck_core::Outcome;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Limits a healthy host stays within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceThresholds {
    /// Memory usage (percent) at or above which the host is DOWN
    pub max_memory_percent: f64,
    /// Free space on the first disk below which the host is DOWN
    pub min_free_disk_mb: u64,
}

impl Default for ResourceThresholds {
    fn default() -> Self {
        Self {
            max_memory_percent: 95.0,
            min_free_disk_mb: 10,
        }
    }
}

/// One reading of host resources
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    /// None when no disk is visible (containers, some sandboxes)
    pub disk_free_mb: Option<u64>,
    pub disk_total_mb: Option<u64>,
}

impl ResourceSample {
    pub fn memory_percent(&self) -> f64 {
        if self.memory_total_mb == 0 {
            return 0.0;
        }
        self.memory_used_mb as f64 * 100.0 / self.memory_total_mb as f64
    }

    /// Judge the sample; details always carry the measured values
    pub fn evaluate(&self, thresholds: &ResourceThresholds) -> Outcome {
        let memory_percent = self.memory_percent();

        let problem = if memory_percent >= thresholds.max_memory_percent {
            Some(format!(
                "memory usage {:.1}% exceeds {:.1}%",
                memory_percent, thresholds.max_memory_percent
            ))
        } else {
            match self.disk_free_mb {
                Some(free) if free < thresholds.min_free_disk_mb => Some(format!(
                    "free disk space {} MB below {} MB",
                    free, thresholds.min_free_disk_mb
                )),
                _ => None,
            }
        };

        let outcome = match problem {
            Some(message) => Outcome::down_with_error(message),
            None => Outcome::up(),
        };

        let outcome = outcome
            .with_detail("memory_used_mb", self.memory_used_mb)
            .with_detail("memory_total_mb", self.memory_total_mb)
            .with_detail("memory_threshold_percent", thresholds.max_memory_percent)
            .with_detail("disk_threshold_mb", thresholds.min_free_disk_mb);

        match (self.disk_free_mb, self.disk_total_mb) {
            (Some(free), Some(total)) => outcome
                .with_detail("disk_free_mb", free)
                .with_detail("disk_total_mb", total),
            _ => outcome,
        }
    }
}

/// HealthIndicator over memory and disk usage using sysinfo
pub struct SystemResourceIndicator {
    system: Mutex<System>,
    thresholds: ResourceThresholds,
}

impl SystemResourceIndicator {
    /// Create an indicator with the given limits
    ///
    /// # Example
    /// ```ignore
    /// let indicator = SystemResourceIndicator::new(ResourceThresholds::default());
    /// ```
    pub fn new(thresholds: ResourceThresholds) -> Self {
        Self {
            system: Mutex::new(System::new()),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &ResourceThresholds {
        &self.thresholds
    }

    /// Take a fresh reading of memory and the first disk
    pub fn sample(&self) -> Result<ResourceSample, IndicatorError> {
        let mut sys = self
            .system
            .lock()
            .map_err(|_| IndicatorError::Unavailable("system monitor lock poisoned".to_string()))?;
        sys.refresh_memory();

        let memory_total_mb = sys.total_memory() / BYTES_PER_MB;
        let memory_used_mb = sys.used_memory() / BYTES_PER_MB;
        if memory_total_mb == 0 {
            return Err(IndicatorError::Unavailable(
                "total memory reported as zero".to_string(),
            ));
        }

        let disks = Disks::new_with_refreshed_list();
        let (disk_free_mb, disk_total_mb) = match disks.first() {
            Some(disk) => (
                Some(disk.available_space() / BYTES_PER_MB),
                Some(disk.total_space() / BYTES_PER_MB),
            ),
            None => (None, None),
        };

        debug!(
            mem_used_mb = %memory_used_mb,
            mem_total_mb = %memory_total_mb,
            disk_free_mb = ?disk_free_mb,
            "System resources sampled"
        );

        Ok(ResourceSample {
            memory_used_mb,
            memory_total_mb,
            disk_free_mb,
            disk_total_mb,
        })
    }
}

impl Default for SystemResourceIndicator {
    fn default() -> Self {
        Self::new(ResourceThresholds::default())
    }
}

impl HealthIndicator for SystemResourceIndicator {
    fn name(&self) -> &str {
        "system_resources"
    }

    fn health(&self) -> Result<Outcome, IndicatorError> {
        Ok(self.sample()?.evaluate(&self.thresholds))
    }
}
