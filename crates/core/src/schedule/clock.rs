//! The phase clock.

use std::time::Duration;

use tokio::time::Instant;

use super::{Phase, PhaseDecision, ScheduleConfig};

/// Derive the scheduling phase and the interval to use at `now`.
pub fn current_phase(now: Instant, schedule: &ScheduleConfig) -> PhaseDecision {
    let Some(release) = schedule.release else {
        return PhaseDecision {
            phase: Phase::Open,
            interval: schedule.steady_interval,
        };
    };

    if now >= release {
        return PhaseDecision {
            phase: Phase::Open,
            interval: schedule.steady_interval,
        };
    }

    // A window reaching back past the clock's origin covers every instant.
    match release.checked_sub(schedule.advance_window) {
        Some(wake_at) if now < wake_at => PhaseDecision {
            phase: Phase::Waiting,
            interval: wake_at.saturating_duration_since(now),
        },
        _ => PhaseDecision {
            phase: Phase::PreOpen,
            interval: schedule.pre_open_interval,
        },
    }
}

/// Steady interval widened by consecutive transient failures, capped.
pub(crate) fn backoff_interval(base: Duration, consecutive_transient: u32, cap: Duration) -> Duration {
    if consecutive_transient <= 1 {
        return base;
    }
    let factor = 1u32 << (consecutive_transient - 1).min(16);
    base.saturating_mul(factor).min(cap.max(base))
}
