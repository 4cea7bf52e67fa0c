// Engine constants (ADR: No magic values)
use std::time::Duration;

/// Default number of probe workers (strict submission-order serialization)
pub const DEFAULT_WORKER_COUNT: usize = 1;

/// First drain window used by the lifecycle manager (5s)
pub const DEFAULT_DRAIN_GRACE_WINDOW: Duration = Duration::from_secs(5);

/// Second, shorter drain window that confirms termination after forced cancellation (1s)
pub const DEFAULT_CONFIRM_GRACE_WINDOW: Duration = Duration::from_secs(1);

/// Detail message for executions resolved by the timeout watcher
pub const HEALTH_CHECK_TIMEOUT_MESSAGE: &str = "Health check timed out";

/// Log message for executions whose probe failed
pub const HEALTH_CHECK_FAILED_MESSAGE: &str = "Health check failed";

/// Detail message for executions discarded by forced shutdown
pub const HEALTH_CHECK_CANCELLED_MESSAGE: &str = "Health check cancelled";
