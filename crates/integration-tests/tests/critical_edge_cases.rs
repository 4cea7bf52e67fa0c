//! Critical edge cases: races, zero timeouts, forced shutdown, blocking callers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use healthcheck_core::application::SchedulerState;
use healthcheck_core::port::mocks::{MockBehavior, MockIndicator};
use healthcheck_core::{
    AsyncHealthChecker, EngineConfig, Outcome, ResolutionCause, ShutdownPhase, Status,
};

fn config(worker_count: usize, drain_ms: u64, confirm_ms: u64) -> EngineConfig {
    EngineConfig {
        worker_count,
        drain_grace_window: Duration::from_millis(drain_ms),
        confirm_grace_window: Duration::from_millis(confirm_ms),
        ..Default::default()
    }
}

/// Edge Case 1: Zero timeout is accepted and resolves immediately
#[tokio::test]
async fn test_zero_timeout_resolves_immediately() {
    let checker = AsyncHealthChecker::new(EngineConfig::default()).unwrap();

    let started = Instant::now();
    let resolution = checker
        .perform_check(
            || {
                std::thread::sleep(Duration::from_millis(200));
                Ok::<_, anyhow::Error>(Outcome::up())
            },
            Duration::ZERO,
        )
        .unwrap()
        .resolution()
        .await;

    assert!(started.elapsed() < Duration::from_millis(150));
    assert_eq!(resolution.cause(), ResolutionCause::TimedOut);

    checker.shutdown().await;
}

/// Edge Case 2: Negative second timeouts clamp to zero
#[tokio::test]
async fn test_negative_timeout_secs() {
    let checker = AsyncHealthChecker::new(EngineConfig::default()).unwrap();

    let handle = checker
        .perform_check_secs(
            || {
                std::thread::sleep(Duration::from_millis(100));
                Ok::<_, anyhow::Error>(Outcome::up())
            },
            -5,
        )
        .unwrap();
    assert_eq!(handle.timeout(), Duration::ZERO);

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.status(), Status::Down);
    assert_eq!(outcome.error_message(), Some("Health check timed out"));

    checker.shutdown().await;
}

/// Edge Case 3: Completion racing the watcher resolves exactly once
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_completion_races_timeout() {
    let checker = AsyncHealthChecker::new(config(4, 5_000, 1_000)).unwrap();

    let mut handles = Vec::new();
    for _ in 0..50 {
        handles.push(
            checker
                .perform_check(
                    || {
                        std::thread::sleep(Duration::from_millis(5));
                        Ok::<_, anyhow::Error>(Outcome::up())
                    },
                    Duration::from_millis(5),
                )
                .unwrap(),
        );
    }

    for handle in handles {
        let resolution = handle.resolution().await;
        match resolution.cause() {
            ResolutionCause::Completed => assert!(resolution.outcome().is_up()),
            ResolutionCause::TimedOut => assert_eq!(
                resolution.outcome().error_message(),
                Some("Health check timed out")
            ),
            other => panic!("unexpected cause {:?}", other),
        }
    }

    let report = checker.shutdown().await;
    assert_eq!(report.phase, ShutdownPhase::Graceful);
}

/// Edge Case 4: Panicking indicators are isolated and reported as DOWN
#[tokio::test]
async fn test_panicking_indicator_is_isolated() {
    let checker = AsyncHealthChecker::new(EngineConfig::default()).unwrap();

    let panicking = Arc::new(MockIndicator::new(
        "cache",
        MockBehavior::Panic("boom".to_string()),
    ));
    let outcome = checker
        .check_indicator(panicking, Duration::from_secs(1))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(outcome.status(), Status::Down);
    assert!(outcome.error_message().unwrap().contains("boom"));

    // Worker survives the panic
    let healthy = Arc::new(MockIndicator::new_up());
    let outcome = checker
        .check_indicator(healthy, Duration::from_secs(1))
        .unwrap()
        .await
        .unwrap();
    assert!(outcome.is_up());

    checker.shutdown().await;
}

/// Edge Case 5: Forced shutdown discards queued checks and cancels their handles
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_forced_shutdown_cancels_queued_checks() {
    let checker = AsyncHealthChecker::new(config(1, 50, 2_000)).unwrap();
    let runs = Arc::new(AtomicUsize::new(0));

    let runs_slow = runs.clone();
    let running = checker
        .perform_check(
            move || {
                runs_slow.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(300));
                Ok::<_, anyhow::Error>(Outcome::up())
            },
            Duration::from_secs(30),
        )
        .unwrap();
    // Let the single worker pick up the first probe
    tokio::time::sleep(Duration::from_millis(30)).await;

    let runs_queued = runs.clone();
    let queued = checker
        .perform_check(
            move || {
                runs_queued.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(Outcome::up())
            },
            Duration::from_secs(30),
        )
        .unwrap();

    let report = checker.shutdown().await;
    assert_eq!(report.phase, ShutdownPhase::Forced);
    assert_eq!(checker.state(), SchedulerState::Terminated);

    let queued = queued.resolution().await;
    assert_eq!(queued.cause(), ResolutionCause::Cancelled);
    assert_eq!(
        queued.outcome().error_message(),
        Some("Health check cancelled")
    );
    // Resolved either way, never left hanging
    let _ = running.resolution().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// Edge Case 6: A probe that never returns leaves shutdown incomplete
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stuck_probe_reports_incomplete() {
    let checker = AsyncHealthChecker::new(config(1, 30, 30)).unwrap();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

    let handle = checker
        .perform_check(
            move || {
                let _ = release_rx.recv();
                Ok::<_, anyhow::Error>(Outcome::up())
            },
            Duration::from_secs(30),
        )
        .unwrap();

    let report = checker.shutdown().await;
    assert_eq!(report.phase, ShutdownPhase::Incomplete);
    assert_eq!(report.outstanding, 1);

    // Handle resolves as cancelled even though the probe is still blocked
    assert_eq!(handle.resolution().await.cause(), ResolutionCause::Cancelled);
    release_tx.send(()).unwrap();
}

/// Edge Case 7: Callers outside the runtime can block on a handle
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_outcome_from_plain_thread() {
    let checker = AsyncHealthChecker::new(EngineConfig::default()).unwrap();

    let handle = checker
        .perform_check(
            || Ok::<_, anyhow::Error>(Outcome::up().with_detail("source", "thread")),
            Duration::from_secs(3),
        )
        .unwrap();

    let outcome = std::thread::spawn(move || handle.blocking_outcome())
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(outcome.detail("source"), Some(&serde_json::json!("thread")));

    checker.shutdown().await;
}

/// Edge Case 8: Invalid configuration is refused before any task is spawned
#[tokio::test]
async fn test_invalid_config_refused() {
    let result = AsyncHealthChecker::new(config(0, 100, 100));
    assert!(matches!(
        result,
        Err(healthcheck_core::EngineError::Config(_))
    ));
}

/// Edge Case 9: Constructing the checker outside a runtime is an error, not a panic
#[test]
fn test_checker_outside_runtime() {
    let result = AsyncHealthChecker::new(EngineConfig::default());
    assert!(matches!(
        result,
        Err(healthcheck_core::EngineError::Runtime(_))
    ));
}

/// Edge Case 10: Concurrent shutdown calls share one report
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_shutdown_shares_one_report() {
    let checker = Arc::new(AsyncHealthChecker::new(EngineConfig::default()).unwrap());

    let first = tokio::spawn({
        let checker = checker.clone();
        async move { checker.shutdown().await }
    });
    let second = tokio::spawn({
        let checker = checker.clone();
        async move { checker.shutdown().await }
    });

    let first = first.await.unwrap();
    let second = second.await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.phase, ShutdownPhase::Graceful);
    assert_eq!(checker.state(), SchedulerState::Terminated);
}

/// Edge Case 11: Dropping the checker without shutdown cancels pending checks
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drop_without_shutdown_cancels_pending() {
    let checker = AsyncHealthChecker::new(EngineConfig::default()).unwrap();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let queued_runs = Arc::new(AtomicUsize::new(0));

    // Occupy the single worker so the next check stays queued
    let busy = checker
        .perform_check(
            move || {
                let _ = release_rx.recv();
                Ok::<_, anyhow::Error>(Outcome::up())
            },
            Duration::from_secs(30),
        )
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let runs = queued_runs.clone();
    let queued = checker
        .perform_check(
            move || {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(Outcome::up())
            },
            Duration::from_secs(30),
        )
        .unwrap();

    drop(checker);

    let resolution = tokio::time::timeout(Duration::from_secs(1), queued.resolution())
        .await
        .expect("queued check must resolve after drop");
    assert_eq!(resolution.cause(), ResolutionCause::Cancelled);
    assert_eq!(busy.resolution().await.cause(), ResolutionCause::Cancelled);

    release_tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(queued_runs.load(Ordering::SeqCst), 0);
}
