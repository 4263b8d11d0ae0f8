//! Schedule types.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;

use crate::config::{RetrySettings, ScheduleSettings};

use super::ScheduleError;

/// Scheduling regime derived from time-to-release. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Waiting,
    PreOpen,
    Open,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::PreOpen => "pre_open",
            Phase::Open => "open",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the phase clock.
///
/// For [`Phase::Waiting`], `interval` is the time left until the advance
/// window opens; otherwise it is the pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDecision {
    pub phase: Phase,
    pub interval: Duration,
}

/// Bounds on the retry-forever policy. Unbounded by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Stop attempting a target after this long in PreOpen/Open.
    pub max_duration: Option<Duration>,
    /// Cap for exponential backoff on consecutive transient errors in Open.
    pub transient_backoff_max: Option<Duration>,
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_duration: settings.max_duration_secs.map(Duration::from_secs),
            transient_backoff_max: settings.transient_backoff_max_ms.map(Duration::from_millis),
        }
    }
}

/// Immutable per-run schedule.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Monotonic release deadline; `None` means "open now".
    pub release: Option<Instant>,
    /// Wall-clock release time, for display only.
    pub release_at: Option<DateTime<Local>>,
    pub advance_window: Duration,
    pub steady_interval: Duration,
    pub pre_open_interval: Duration,
    pub worker_pool_capacity: usize,
    pub retry: RetryPolicy,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::from_settings_unscheduled(&ScheduleSettings::default())
    }
}

impl ScheduleConfig {
    /// Schedule with no release instant: always Open.
    pub fn from_settings_unscheduled(settings: &ScheduleSettings) -> Self {
        Self {
            release: None,
            release_at: None,
            advance_window: Duration::from_secs(settings.advance_window_secs),
            steady_interval: Duration::from_millis(settings.interval_ms),
            pre_open_interval: Duration::from_millis(settings.pre_open_interval_ms),
            worker_pool_capacity: settings.max_workers,
            retry: RetryPolicy::from(&settings.retry),
        }
    }

    /// Build a schedule releasing at the given wall-clock time.
    pub fn from_settings(
        settings: &ScheduleSettings,
        release_at: Option<DateTime<Local>>,
    ) -> Result<Self, ScheduleError> {
        Self::from_settings_at(settings, release_at, Local::now(), Instant::now())
    }

    /// Like [`from_settings`](Self::from_settings) with explicit clocks.
    pub fn from_settings_at(
        settings: &ScheduleSettings,
        release_at: Option<DateTime<Local>>,
        wall_now: DateTime<Local>,
        mono_now: Instant,
    ) -> Result<Self, ScheduleError> {
        let mut schedule = Self::from_settings_unscheduled(settings);
        if let Some(at) = release_at {
            let until = (at - wall_now)
                .to_std()
                .ok()
                .filter(|d| !d.is_zero())
                .ok_or_else(|| ScheduleError::InPast(at.format("%Y-%m-%d %H:%M:%S").to_string()))?;
            schedule.release = Some(mono_now + until);
            schedule.release_at = Some(at);
        }
        Ok(schedule)
    }

    /// Set the release deadline directly.
    pub fn with_release(mut self, release: Instant) -> Self {
        self.release = Some(release);
        self
    }

    pub fn with_advance_window(mut self, window: Duration) -> Self {
        self.advance_window = window;
        self
    }

    pub fn with_steady_interval(mut self, interval: Duration) -> Self {
        self.steady_interval = interval;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.worker_pool_capacity = capacity;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Instant the advance window opens, if a release is scheduled.
    pub fn pre_open_at(&self) -> Option<Instant> {
        self.release
            .map(|r| r.checked_sub(self.advance_window).unwrap_or(r))
    }

    /// Reject schedules the engine cannot run.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_pool_capacity == 0 {
            return Err("worker pool capacity must be at least 1".to_string());
        }
        if self.steady_interval.is_zero() || self.pre_open_interval.is_zero() {
            return Err("polling intervals must be non-zero".to_string());
        }
        Ok(())
    }
}
