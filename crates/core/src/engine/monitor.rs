//! Background session monitor.
//!
//! Probes session validity on a fixed period after a warm-up delay. Runs
//! independently of workers and shares only the auth context with them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::client::{ProbeStatus, SessionProbe};
use crate::config::MonitorSettings;
use crate::metrics::SESSION_PROBES_TOTAL;

use super::{CancelReason, CancelSignal};

/// Timing and escalation for one monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorPlan {
    pub warmup: Duration,
    pub period: Duration,
    /// Raise the attached run signal when the probe reports Invalid.
    pub cancel_on_invalid: bool,
    /// Stop probing after the first Invalid result.
    pub stop_on_invalid: bool,
}

impl MonitorPlan {
    /// Validity probing as configured.
    pub fn validity(settings: &MonitorSettings) -> Self {
        Self {
            warmup: Duration::from_secs(settings.warmup_secs),
            period: Duration::from_secs(settings.period_secs),
            cancel_on_invalid: settings.cancel_on_invalid,
            stop_on_invalid: false,
        }
    }

    /// Keep-alive heartbeats, or `None` when disabled. Never cancels a run;
    /// stops once the server rejects the session.
    pub fn keepalive(settings: &MonitorSettings) -> Option<Self> {
        if settings.keepalive_secs == 0 {
            return None;
        }
        let period = Duration::from_secs(settings.keepalive_secs);
        Some(Self {
            warmup: period,
            period,
            cancel_on_invalid: false,
            stop_on_invalid: true,
        })
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    last: RwLock<Option<ProbeStatus>>,
    probes: AtomicU64,
}

/// Spawner for monitor tasks.
pub struct SessionMonitor;

impl SessionMonitor {
    /// Start probing in a background task.
    pub fn spawn(
        probe: Arc<dyn SessionProbe>,
        auth: Arc<AuthContext>,
        plan: MonitorPlan,
        run_signal: Option<CancelSignal>,
    ) -> MonitorHandle {
        let shutdown = CancellationToken::new();
        let state = Arc::new(MonitorState::default());

        let task = tokio::spawn(run_monitor(
            probe,
            auth,
            plan,
            run_signal,
            shutdown.clone(),
            Arc::clone(&state),
        ));

        MonitorHandle {
            shutdown,
            task,
            state,
        }
    }
}

/// Handle to a running monitor.
pub struct MonitorHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
    state: Arc<MonitorState>,
}

impl MonitorHandle {
    /// Stop the monitor and wait for its task to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Session monitor task failed");
        }
    }

    /// Most recent probe result.
    pub fn last_status(&self) -> Option<ProbeStatus> {
        self.state
            .last
            .read()
            .map(|last| last.clone())
            .unwrap_or_default()
    }

    pub fn probe_count(&self) -> u64 {
        self.state.probes.load(Ordering::Acquire)
    }
}

async fn run_monitor(
    probe: Arc<dyn SessionProbe>,
    auth: Arc<AuthContext>,
    plan: MonitorPlan,
    run_signal: Option<CancelSignal>,
    shutdown: CancellationToken,
    state: Arc<MonitorState>,
) {
    debug!(probe = probe.name(), warmup_secs = plan.warmup.as_secs(), "Session monitor started");

    tokio::select! {
        _ = shutdown.cancelled() => return,
        _ = tokio::time::sleep(plan.warmup) => {}
    }

    loop {
        let status = tokio::select! {
            _ = shutdown.cancelled() => return,
            status = probe.probe(&auth) => status,
        };

        SESSION_PROBES_TOTAL
            .with_label_values(&[probe.name(), status.as_str()])
            .inc();
        record(&probe, &status, &plan, run_signal.as_ref());
        let stop = plan.stop_on_invalid && status.is_invalid();

        if let Ok(mut last) = state.last.write() {
            *last = Some(status);
        }
        state.probes.fetch_add(1, Ordering::AcqRel);

        if stop {
            info!(probe = probe.name(), "Session rejected, stopping monitor");
            return;
        }

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(plan.period) => {}
        }
    }
}

fn record(
    probe: &Arc<dyn SessionProbe>,
    status: &ProbeStatus,
    plan: &MonitorPlan,
    run_signal: Option<&CancelSignal>,
) {
    match status {
        ProbeStatus::Valid(heartbeat) => match heartbeat {
            Some(hb) => info!(
                probe = probe.name(),
                server_time = hb.server_time.as_deref().unwrap_or("-"),
                online = hb.online_count.unwrap_or(0),
                "Session alive"
            ),
            None => debug!(probe = probe.name(), "Session valid"),
        },
        ProbeStatus::Invalid(reason) => {
            warn!(probe = probe.name(), reason = %reason, "Session appears invalid, log in again");
            if plan.cancel_on_invalid {
                if let Some(signal) = run_signal {
                    signal.raise(CancelReason::SessionInvalid {
                        reason: reason.clone(),
                    });
                }
            }
        }
        ProbeStatus::Unreachable(detail) => {
            warn!(probe = probe.name(), error = %detail, "Session probe failed")
        }
    }
}
