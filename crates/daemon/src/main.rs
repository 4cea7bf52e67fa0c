//! Healthcheck - Main Entry Point
//! Runs the system resource indicator once through the engine

use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use healthcheck_core::{AsyncHealthChecker, EngineConfig, ShutdownPhase};
use healthcheck_infra_system::{ResourceThresholds, SystemResourceIndicator};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_TIMEOUT_SECS: i64 = 3;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 1. Initialize logging
    let log_format =
        std::env::var("HEALTHCHECK_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("healthcheck=info"))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Healthcheck v{} starting...", VERSION);

    // 2. Load configuration
    let config = EngineConfig::from_env().context("Invalid engine configuration")?;
    let timeout_secs = env_parse("HEALTHCHECK_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    let thresholds = load_thresholds()?;

    info!(
        worker_count = config.worker_count,
        timeout_secs = timeout_secs,
        max_memory_percent = thresholds.max_memory_percent,
        min_free_disk_mb = thresholds.min_free_disk_mb,
        "Configuration loaded"
    );

    // 3. Wire engine and indicator
    let checker = AsyncHealthChecker::new(config).context("Engine start failed")?;
    let indicator = Arc::new(SystemResourceIndicator::new(thresholds));
    let timeout = Duration::from_secs(timeout_secs.max(0).unsigned_abs());

    // 4. Run the check (Ctrl+C abandons it)
    let handle = checker.check_indicator(indicator, timeout)?;
    let check_id = handle.check_id();
    let result = tokio::select! {
        result = handle.outcome() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    // 5. Report
    let exit = match result {
        Some(Ok(outcome)) => {
            let rendered = serde_json::to_string(&outcome)?;
            if outcome.is_up() {
                info!(check_id = %check_id, outcome = %rendered, "Health check completed");
                ExitCode::SUCCESS
            } else {
                warn!(check_id = %check_id, outcome = %rendered, "Health check reported DOWN");
                ExitCode::FAILURE
            }
        }
        Some(Err(e)) => {
            error!(check_id = %check_id, error = %e, "Health check failed");
            ExitCode::FAILURE
        }
        None => {
            info!("Shutdown signal received. Abandoning check...");
            ExitCode::FAILURE
        }
    };

    // 6. Shutdown
    let report = checker.shutdown().await;
    if report.phase == ShutdownPhase::Incomplete {
        warn!(outstanding = report.outstanding, "Exiting with work still running");
    }

    info!("Shutdown complete.");

    Ok(exit)
}

fn load_thresholds() -> Result<ResourceThresholds> {
    let mut thresholds = ResourceThresholds::default();
    if let Some(percent) = env_parse("HEALTHCHECK_MAX_MEMORY_PERCENT")? {
        thresholds.max_memory_percent = percent;
    }
    if let Some(mb) = env_parse("HEALTHCHECK_MIN_FREE_DISK_MB")? {
        thresholds.min_free_disk_mb = mb;
    }
    Ok(thresholds)
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} is not valid: {}", key, raw)),
        Err(_) => Ok(None),
    }
}
