//! Per-target acquisition loop.

use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::auth::AuthContext;
use crate::client::{AttemptOutcome, ResourceClient};
use crate::metrics::{
    ATTEMPTS_IN_FLIGHT, ATTEMPTS_TOTAL, ATTEMPT_DURATION, TARGETS_ACQUIRED, TARGETS_EXHAUSTED,
};
use crate::schedule::{backoff_interval, current_phase, Phase, ScheduleConfig};
use crate::target::{Target, TargetError, TargetStore};

use super::{CancelReason, CancelSignal, TargetReport, WorkerState};

/// State published by one worker. Only that worker writes it.
#[derive(Debug, Default)]
pub(crate) struct WorkerSlot {
    state: AtomicU8,
    attempts: AtomicU64,
}

impl WorkerSlot {
    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }
}

/// Drives one target until it is acquired, cancelled or exhausted.
pub struct AcquisitionWorker {
    target: Target,
    client: Arc<dyn ResourceClient>,
    store: Arc<dyn TargetStore>,
    auth: Arc<AuthContext>,
    schedule: Arc<ScheduleConfig>,
    pool: Arc<Semaphore>,
    signal: CancelSignal,
    slot: Arc<WorkerSlot>,
    in_flight: Arc<AtomicUsize>,
}

impl AcquisitionWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        target: Target,
        client: Arc<dyn ResourceClient>,
        store: Arc<dyn TargetStore>,
        auth: Arc<AuthContext>,
        schedule: Arc<ScheduleConfig>,
        pool: Arc<Semaphore>,
        signal: CancelSignal,
        slot: Arc<WorkerSlot>,
        in_flight: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            target,
            client,
            store,
            auth,
            schedule,
            pool,
            signal,
            slot,
            in_flight,
        }
    }

    /// Run the attempt loop to a terminal state.
    pub async fn run(self) -> TargetReport {
        let mut active_since: Option<Instant> = None;
        let mut consecutive_transient: u32 = 0;

        loop {
            if self.signal.is_raised() {
                return self.finish(WorkerState::Cancelled);
            }

            let now = Instant::now();
            let decision = current_phase(now, &self.schedule);

            if decision.phase == Phase::Waiting {
                info!(
                    course = %self.target.display_name(),
                    wait_secs = decision.interval.as_secs(),
                    "Waiting for the advance window"
                );
                if !self.pause(decision.interval).await {
                    return self.finish(WorkerState::Cancelled);
                }
                continue;
            }

            let started = *active_since.get_or_insert_with(|| {
                self.slot.set_state(WorkerState::Attempting);
                now
            });
            if let Some(max) = self.schedule.retry.max_duration {
                if now.duration_since(started) >= max {
                    warn!(
                        course = %self.target.display_name(),
                        attempts = self.slot.attempts(),
                        "Retry budget exhausted, giving up"
                    );
                    TARGETS_EXHAUSTED.inc();
                    return self.finish(WorkerState::Exhausted);
                }
            }

            let Some(outcome) = self.attempt_with_permit(decision.phase).await else {
                return self.finish(WorkerState::Cancelled);
            };

            match outcome {
                AttemptOutcome::Success => {
                    info!(
                        course = %self.target.display_name(),
                        category = %self.target.category,
                        phase = %decision.phase,
                        "Acquired"
                    );
                    TARGETS_ACQUIRED.inc();
                    self.remove_descriptor();
                    return self.finish(WorkerState::Succeeded);
                }
                AttemptOutcome::AuthExpired => {
                    let raised = self.signal.raise(CancelReason::AuthExpired {
                        target: self.target.id.clone(),
                    });
                    if raised {
                        error!(
                            course = %self.target.display_name(),
                            "Session expired, cancelling all workers"
                        );
                    }
                    return self.finish(WorkerState::Cancelled);
                }
                AttemptOutcome::Rejected(reason) => {
                    consecutive_transient = 0;
                    info!(
                        course = %self.target.display_name(),
                        category = %self.target.category,
                        phase = %decision.phase,
                        outcome = "rejected",
                        reason = %reason,
                        "Attempt rejected"
                    );
                }
                AttemptOutcome::TransientError(detail) => {
                    consecutive_transient = consecutive_transient.saturating_add(1);
                    warn!(
                        course = %self.target.display_name(),
                        category = %self.target.category,
                        phase = %decision.phase,
                        outcome = "transient_error",
                        error = %detail,
                        "Attempt failed"
                    );
                }
            }

            let interval = self.retry_interval(decision.phase, decision.interval, consecutive_transient);
            if !self.pause(interval).await {
                return self.finish(WorkerState::Cancelled);
            }
        }
    }

    /// Wait for a pool permit, then issue one call. `None` if cancelled first.
    async fn attempt_with_permit(&self, phase: Phase) -> Option<AttemptOutcome> {
        let _permit = tokio::select! {
            biased;
            _ = self.signal.cancelled() => return None,
            permit = self.pool.acquire() => permit.ok()?,
        };
        if self.signal.is_raised() {
            return None;
        }

        self.slot.attempts.fetch_add(1, Ordering::AcqRel);
        let in_flight = InFlight::enter(&self.in_flight);
        let started = Instant::now();

        // Not raced against the signal: an in-flight call always completes.
        let outcome = self.client.attempt(&self.target, &self.auth).await;

        drop(in_flight);
        ATTEMPT_DURATION
            .with_label_values(&[outcome.as_str()])
            .observe(started.elapsed().as_secs_f64());
        ATTEMPTS_TOTAL
            .with_label_values(&[outcome.as_str(), phase.as_str()])
            .inc();

        Some(outcome)
    }

    fn retry_interval(&self, phase: Phase, base: Duration, consecutive_transient: u32) -> Duration {
        match (phase, self.schedule.retry.transient_backoff_max) {
            (Phase::Open, Some(cap)) => backoff_interval(base, consecutive_transient, cap),
            _ => base,
        }
    }

    /// Sleep unless cancelled first. Returns `false` on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.signal.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    fn remove_descriptor(&self) {
        match self.store.remove(&self.target.id) {
            Ok(()) => debug!(course = %self.target.display_name(), "Removed target descriptor"),
            Err(TargetError::NotFound(_)) => {
                debug!(course = %self.target.display_name(), "Target descriptor already removed")
            }
            Err(e) => warn!(
                course = %self.target.display_name(),
                error = %e,
                "Failed to remove target descriptor"
            ),
        }
    }

    fn finish(&self, state: WorkerState) -> TargetReport {
        self.slot.set_state(state);
        TargetReport {
            target: self.target.clone(),
            state,
            attempts: self.slot.attempts(),
        }
    }
}

/// Counts one call in flight until dropped, including when the task is aborted mid-call.
struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        ATTEMPTS_IN_FLIGHT.inc();
        Self { counter }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        ATTEMPTS_IN_FLIGHT.dec();
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}
