//! Acquisition coordinator.
//!
//! Spawns one worker task per target and waits for every worker to reach a
//! terminal state. In-flight acquisition calls across all workers are bounded
//! by a semaphore sized to the worker pool capacity.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::AbortHandle;
use tracing::{error, info, warn};

use crate::auth::AuthContext;
use crate::client::ResourceClient;
use crate::schedule::ScheduleConfig;
use crate::target::{Target, TargetStore};

use super::worker::WorkerSlot;
use super::{
    AcquisitionWorker, CancelReason, CancelSignal, CoordinatorStatus, EngineError, RunReport,
    TargetReport, WorkerState,
};

/// Fans targets out to workers and collects their outcomes.
pub struct AcquisitionCoordinator {
    client: Arc<dyn ResourceClient>,
    store: Arc<dyn TargetStore>,
    schedule: Arc<ScheduleConfig>,
    signal: CancelSignal,

    // Runtime state
    running: Arc<AtomicBool>,
    slots: Arc<RwLock<Vec<Arc<WorkerSlot>>>>,
    in_flight: Arc<AtomicUsize>,
}

impl AcquisitionCoordinator {
    /// Create a coordinator for a single run.
    pub fn new(
        client: Arc<dyn ResourceClient>,
        store: Arc<dyn TargetStore>,
        schedule: ScheduleConfig,
    ) -> Self {
        Self {
            client,
            store,
            schedule: Arc::new(schedule),
            signal: CancelSignal::new(),
            running: Arc::new(AtomicBool::new(false)),
            slots: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Use an externally owned cancellation signal.
    pub fn with_signal(mut self, signal: CancelSignal) -> Self {
        self.signal = signal;
        self
    }

    /// The run-wide cancellation signal shared with every worker.
    pub fn signal(&self) -> CancelSignal {
        self.signal.clone()
    }

    /// Operator interrupt. Workers stop before their next attempt.
    pub fn cancel(&self) -> bool {
        let raised = self.signal.raise(CancelReason::Operator);
        if raised {
            warn!("Run cancelled by operator");
        }
        raised
    }

    /// Get a snapshot of worker states.
    pub async fn status(&self) -> CoordinatorStatus {
        let slots = self.slots.read().await;
        let mut status = CoordinatorStatus {
            running: self.running.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            cancel_reason: self.signal.reason(),
            ..Default::default()
        };
        for slot in slots.iter() {
            match slot.state() {
                WorkerState::Pending => status.pending += 1,
                WorkerState::Attempting => status.attempting += 1,
                WorkerState::Succeeded => status.succeeded += 1,
                WorkerState::Cancelled => status.cancelled += 1,
                WorkerState::Exhausted => status.exhausted += 1,
            }
        }
        status
    }

    /// Attempt every target until each one is acquired, cancelled or exhausted.
    pub async fn run_all(
        &self,
        targets: Vec<Target>,
        auth: Arc<AuthContext>,
    ) -> Result<RunReport, EngineError> {
        self.schedule.validate().map_err(EngineError::ConfigInvalid)?;
        if targets.is_empty() {
            return Err(EngineError::NoTargets);
        }
        let mut seen = HashSet::new();
        for target in &targets {
            if !seen.insert(target.id.as_str()) {
                return Err(EngineError::ConfigInvalid(format!(
                    "target {} listed more than once",
                    target.id
                )));
            }
        }

        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning);
        }
        let mut guard = RunGuard {
            running: Arc::clone(&self.running),
            workers: Vec::with_capacity(targets.len()),
        };

        info!(
            targets = targets.len(),
            pool = self.schedule.worker_pool_capacity,
            release = ?self.schedule.release_at,
            client = self.client.name(),
            "Starting acquisition run"
        );

        let pool = Arc::new(Semaphore::new(self.schedule.worker_pool_capacity));
        let slots: Vec<Arc<WorkerSlot>> = targets
            .iter()
            .map(|_| Arc::new(WorkerSlot::default()))
            .collect();
        *self.slots.write().await = slots.clone();

        let handles: Vec<_> = targets
            .iter()
            .zip(slots.iter())
            .map(|(target, slot)| {
                let worker = AcquisitionWorker::new(
                    target.clone(),
                    Arc::clone(&self.client),
                    Arc::clone(&self.store),
                    Arc::clone(&auth),
                    Arc::clone(&self.schedule),
                    Arc::clone(&pool),
                    self.signal.clone(),
                    Arc::clone(slot),
                    Arc::clone(&self.in_flight),
                );
                tokio::spawn(worker.run())
            })
            .collect();
        guard
            .workers
            .extend(handles.iter().map(|handle| handle.abort_handle()));

        let results = join_all(handles).await;

        let outcomes = results
            .into_iter()
            .zip(targets)
            .zip(slots)
            .map(|((result, target), slot)| match result {
                Ok(report) => report,
                Err(e) => {
                    error!(course = %target.display_name(), error = %e, "Worker task failed");
                    TargetReport {
                        target,
                        state: WorkerState::Cancelled,
                        attempts: slot.attempts(),
                    }
                }
            })
            .collect();

        let report = RunReport {
            outcomes,
            cancel_reason: self.signal.reason(),
        };
        drop(guard);

        info!(summary = %report.summary(), "Acquisition run finished");
        Ok(report)
    }
}

/// Clears the running flag when a run ends. If the `run_all` future is
/// dropped early, its worker tasks are aborted too.
struct RunGuard {
    running: Arc<AtomicBool>,
    workers: Vec<AbortHandle>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
        self.running.store(false, Ordering::SeqCst);
    }
}
