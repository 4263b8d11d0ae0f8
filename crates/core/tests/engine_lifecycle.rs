//! Acquisition engine lifecycle integration tests.
//!
//! These tests drive whole runs through the coordinator on paused tokio time:
//! pending -> attempting -> succeeded | cancelled | exhausted

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use seatgrab_core::{
    schedule::RetryPolicy,
    testing::{fixtures, MemoryTargetStore, MockResourceClient},
    AcquisitionCoordinator, AttemptOutcome, CancelReason, EngineError, ResourceClient,
    RunReport, ScheduleConfig, Target, TargetStore, WorkerState,
};

/// Test helper bundling a mock client, a memory store and a schedule.
struct TestHarness {
    client: Arc<MockResourceClient>,
    store: Arc<MemoryTargetStore>,
    targets: Vec<Target>,
}

impl TestHarness {
    fn new(count: usize) -> Self {
        let targets = fixtures::targets(count);
        Self {
            client: Arc::new(MockResourceClient::new()),
            store: Arc::new(MemoryTargetStore::with_targets(targets.clone())),
            targets,
        }
    }

    fn coordinator(&self, schedule: ScheduleConfig) -> Arc<AcquisitionCoordinator> {
        Arc::new(AcquisitionCoordinator::new(
            Arc::clone(&self.client) as Arc<dyn ResourceClient>,
            Arc::clone(&self.store) as Arc<dyn TargetStore>,
            schedule,
        ))
    }

    /// Start a run in the background.
    fn spawn_run(
        &self,
        coordinator: &Arc<AcquisitionCoordinator>,
    ) -> JoinHandle<Result<RunReport, EngineError>> {
        let coordinator = Arc::clone(coordinator);
        let targets = self.targets.clone();
        tokio::spawn(async move { coordinator.run_all(targets, fixtures::auth()).await })
    }

    /// Call offsets for one target, relative to `start`.
    async fn offsets(&self, target_id: &str, start: Instant) -> Vec<Duration> {
        self.client
            .call_times(target_id)
            .await
            .into_iter()
            .map(|t| t.duration_since(start))
            .collect()
    }
}

fn steady(interval: Duration) -> ScheduleConfig {
    ScheduleConfig::default().with_steady_interval(interval)
}

fn approx(actual: Duration, expected: Duration) -> bool {
    let tolerance = Duration::from_millis(20);
    actual + tolerance >= expected && actual <= expected + tolerance
}

fn gaps(offsets: &[Duration]) -> Vec<Duration> {
    offsets.windows(2).map(|w| w[1] - w[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn test_worker_keeps_retrying_through_rejections() {
    let harness = TestHarness::new(1);
    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));
    let run = harness.spawn_run(&coordinator);

    tokio::time::sleep(Duration::from_millis(1_000_500)).await;

    assert!(harness.client.calls_for("T0").await >= 1000);
    let status = coordinator.status().await;
    assert!(status.running);
    assert_eq!(status.attempting, 1);
    assert_eq!(status.succeeded, 0);

    coordinator.cancel();
    let report = run.await.unwrap().unwrap();
    assert_eq!(report.outcomes[0].state, WorkerState::Cancelled);
    assert_eq!(report.cancel_reason, Some(CancelReason::Operator));
    assert!(harness.store.contains("T0"));
}

#[tokio::test(start_paused = true)]
async fn test_success_removes_descriptor_once_and_stops() {
    let harness = TestHarness::new(1);
    harness
        .client
        .script(
            "T0",
            vec![
                AttemptOutcome::Rejected("full".to_string()),
                AttemptOutcome::TransientError("timeout".to_string()),
                AttemptOutcome::Success,
            ],
        )
        .await;

    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));
    let report = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.outcomes[0].attempts, 3);
    assert_eq!(harness.client.calls_for("T0").await, 3);
    assert_eq!(harness.store.removals("T0"), 1);
    assert!(!harness.store.contains("T0"));

    // Nothing further is attempted after success.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.client.calls_for("T0").await, 3);
    assert!(!coordinator.status().await.running);
}

#[tokio::test(start_paused = true)]
async fn test_success_with_missing_descriptor_still_succeeds() {
    let harness = TestHarness::new(1);
    harness.store.remove("T0").unwrap();
    harness.client.set_default(AttemptOutcome::Success).await;

    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));
    let report = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].state, WorkerState::Succeeded);
    assert_eq!(harness.store.removals("T0"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_auth_expiry_cancels_every_worker() {
    let harness = TestHarness::new(3);
    harness
        .client
        .script("T0", vec![AttemptOutcome::AuthExpired])
        .await;
    harness
        .client
        .set_delay_for("T0", Duration::from_millis(10))
        .await;
    harness.client.set_delay(Duration::from_millis(500)).await;

    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));
    let report = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap();

    assert_eq!(report.auth_expired_by(), Some("T0"));
    assert_eq!(report.cancelled().len(), 3);
    assert_eq!(report.succeeded().len(), 0);

    // In-flight calls for the other targets completed; none started after.
    for id in ["T1", "T2"] {
        assert_eq!(harness.client.calls_for(id).await, 1);
    }
    for outcome in &report.outcomes {
        assert_eq!(outcome.attempts, 1);
    }
    assert_eq!(harness.client.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_auth_expiry_raises_once() {
    let harness = TestHarness::new(4);
    for id in ["T0", "T1", "T2", "T3"] {
        harness
            .client
            .script(id, vec![AttemptOutcome::AuthExpired])
            .await;
    }

    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));
    let signal = coordinator.signal();
    let report = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap();

    let raised_by = report.auth_expired_by().unwrap().to_string();
    assert!(harness.targets.iter().any(|t| t.id == raised_by));
    assert_eq!(
        signal.reason(),
        Some(CancelReason::AuthExpired { target: raised_by })
    );
    assert_eq!(report.cancelled().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_pool_bounds_in_flight_calls() {
    let harness = TestHarness::new(6);
    harness.client.set_delay(Duration::from_millis(200)).await;

    let coordinator = harness.coordinator(
        steady(Duration::from_secs(1)).with_pool_capacity(2),
    );
    let run = harness.spawn_run(&coordinator);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let status = coordinator.status().await;
    assert_eq!(status.in_flight, 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    coordinator.cancel();
    run.await.unwrap().unwrap();

    assert_eq!(harness.client.max_concurrency(), 2);
    // Every target made progress despite the bound.
    for target in &harness.targets {
        assert!(harness.client.calls_for(&target.id).await > 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_release_cadence() {
    let harness = TestHarness::new(1);
    let start = Instant::now();
    let schedule = steady(Duration::from_secs(5))
        .with_release(start + Duration::from_secs(40))
        .with_advance_window(Duration::from_secs(30));
    let coordinator = harness.coordinator(schedule);
    let run = harness.spawn_run(&coordinator);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(harness.client.calls_for("T0").await, 0);
    assert_eq!(coordinator.status().await.pending, 1);

    tokio::time::sleep(Duration::from_secs(67)).await;
    coordinator.cancel();
    run.await.unwrap().unwrap();

    let offsets = harness.offsets("T0", start).await;
    assert!(approx(offsets[0], Duration::from_secs(10)), "first call at {:?}", offsets[0]);

    let (pre_open, open): (Vec<Duration>, Vec<Duration>) = offsets
        .iter()
        .partition(|o| **o < Duration::from_millis(39_900));
    assert_eq!(pre_open.len(), 30);
    for gap in gaps(&pre_open) {
        assert!(approx(gap, Duration::from_secs(1)), "pre-open gap {:?}", gap);
    }

    assert!(approx(open[0], Duration::from_secs(40)));
    assert!(open.len() >= 6);
    for gap in gaps(&open) {
        assert!(approx(gap, Duration::from_secs(5)), "open gap {:?}", gap);
    }
}

#[tokio::test(start_paused = true)]
async fn test_unscheduled_run_polls_at_steady_interval() {
    let harness = TestHarness::new(1);
    let start = Instant::now();
    let coordinator = harness.coordinator(steady(Duration::from_secs(5)));
    let run = harness.spawn_run(&coordinator);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(coordinator.status().await.attempting, 1);

    tokio::time::sleep(Duration::from_secs(25)).await;
    coordinator.cancel();
    run.await.unwrap().unwrap();

    let offsets = harness.offsets("T0", start).await;
    assert!(approx(offsets[0], Duration::ZERO));
    assert_eq!(offsets.len(), 6);
    for gap in gaps(&offsets) {
        assert!(approx(gap, Duration::from_secs(5)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhausts_target() {
    let harness = TestHarness::new(1);
    let schedule = steady(Duration::from_secs(1)).with_retry(RetryPolicy {
        max_duration: Some(Duration::from_secs(10)),
        transient_backoff_max: None,
    });
    let coordinator = harness.coordinator(schedule);
    let report = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].state, WorkerState::Exhausted);
    assert_eq!(report.outcomes[0].attempts, 10);
    assert_eq!(report.remaining().len(), 1);
    assert!(report.cancel_reason.is_none());
    assert!(harness.store.contains("T0"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_back_off_up_to_cap() {
    let harness = TestHarness::new(1);
    harness
        .client
        .set_default(AttemptOutcome::TransientError("connection reset".to_string()))
        .await;
    let start = Instant::now();
    let schedule = steady(Duration::from_secs(1)).with_retry(RetryPolicy {
        max_duration: None,
        transient_backoff_max: Some(Duration::from_secs(4)),
    });
    let coordinator = harness.coordinator(schedule);
    let run = harness.spawn_run(&coordinator);

    tokio::time::sleep(Duration::from_millis(15_500)).await;
    coordinator.cancel();
    run.await.unwrap().unwrap();

    let offsets = harness.offsets("T0", start).await;
    let expected = [1, 2, 4, 4, 4].map(Duration::from_secs);
    let observed = gaps(&offsets);
    assert_eq!(observed.len(), expected.len());
    for (gap, want) in observed.iter().zip(expected) {
        assert!(approx(*gap, want), "gap {:?}, expected {:?}", gap, want);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_attempts_nothing() {
    let harness = TestHarness::new(2);
    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));
    assert!(coordinator.cancel());
    assert!(!coordinator.cancel());

    let report = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap();

    assert_eq!(report.cancelled().len(), 2);
    assert!(harness.client.calls().await.is_empty());
}

#[tokio::test]
async fn test_invalid_runs_are_rejected_before_scheduling() {
    let harness = TestHarness::new(1);

    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));
    let err = coordinator.run_all(Vec::new(), fixtures::auth()).await.unwrap_err();
    assert!(matches!(err, EngineError::NoTargets));

    let duplicated = vec![fixtures::target("A"), fixtures::target("A")];
    let err = coordinator.run_all(duplicated, fixtures::auth()).await.unwrap_err();
    assert!(matches!(err, EngineError::ConfigInvalid(_)));

    let coordinator = harness.coordinator(steady(Duration::from_secs(1)).with_pool_capacity(0));
    let err = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConfigInvalid(_)));

    assert!(harness.client.calls().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_concurrent_run_is_refused() {
    let harness = TestHarness::new(1);
    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));
    let run = harness.spawn_run(&coordinator);

    tokio::time::sleep(Duration::from_millis(10)).await;
    let err = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyRunning));

    coordinator.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dropped_run_releases_coordinator() {
    let harness = TestHarness::new(2);
    harness.client.set_delay(Duration::from_secs(3)).await;
    let coordinator = harness.coordinator(steady(Duration::from_secs(1)));

    // Abandon the run while calls are in flight.
    let abandoned = tokio::time::timeout(
        Duration::from_secs(5),
        coordinator.run_all(harness.targets.clone(), fixtures::auth()),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(10)).await;
    let status = coordinator.status().await;
    assert!(!status.running);
    assert_eq!(status.in_flight, 0);

    // Workers of the abandoned run are gone.
    let calls = harness.client.calls().await.len();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.client.calls().await.len(), calls);

    // A fresh run is accepted and completes.
    harness.client.set_delay(Duration::ZERO).await;
    harness.client.set_default(AttemptOutcome::Success).await;
    let report = coordinator
        .run_all(harness.targets.clone(), fixtures::auth())
        .await
        .unwrap();
    assert!(report.all_succeeded());
}
