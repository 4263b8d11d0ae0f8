//! Types for the acquisition engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::ScheduleError;
use crate::target::{Target, TargetError};

use super::CancelReason;

/// Errors that abort a run before or instead of scheduling.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid schedule or target set; nothing was attempted.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("no targets to acquire")]
    NoTargets,

    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error("target store error: {0}")]
    Store(#[from] TargetError),
}

impl From<ScheduleError> for EngineError {
    fn from(err: ScheduleError) -> Self {
        EngineError::ConfigInvalid(err.to_string())
    }
}

/// Lifecycle of one target's worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Pending,
    Attempting,
    Succeeded,
    Cancelled,
    /// Retry budget ran out without success.
    Exhausted,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Pending => "pending",
            WorkerState::Attempting => "attempting",
            WorkerState::Succeeded => "succeeded",
            WorkerState::Cancelled => "cancelled",
            WorkerState::Exhausted => "exhausted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerState::Succeeded | WorkerState::Cancelled | WorkerState::Exhausted
        )
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            WorkerState::Pending => 0,
            WorkerState::Attempting => 1,
            WorkerState::Succeeded => 2,
            WorkerState::Cancelled => 3,
            WorkerState::Exhausted => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Attempting,
            2 => WorkerState::Succeeded,
            3 => WorkerState::Cancelled,
            4 => WorkerState::Exhausted,
            _ => WorkerState::Pending,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome for one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target: Target,
    pub state: WorkerState,
    /// Acquisition calls issued for this target.
    pub attempts: u64,
}

/// Result of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// One entry per target, in submission order.
    pub outcomes: Vec<TargetReport>,
    /// Why the run was cancelled, if it was.
    pub cancel_reason: Option<CancelReason>,
}

impl RunReport {
    pub fn succeeded(&self) -> Vec<&Target> {
        self.with_state(|s| s == WorkerState::Succeeded)
    }

    /// Targets not acquired, for whatever reason.
    pub fn remaining(&self) -> Vec<&Target> {
        self.with_state(|s| s != WorkerState::Succeeded)
    }

    pub fn cancelled(&self) -> Vec<&Target> {
        self.with_state(|s| s == WorkerState::Cancelled)
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.state == WorkerState::Succeeded)
    }

    /// Id of the target whose attempt reported the expired session.
    pub fn auth_expired_by(&self) -> Option<&str> {
        match &self.cancel_reason {
            Some(CancelReason::AuthExpired { target }) => Some(target.as_str()),
            _ => None,
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} acquired, {} remaining",
            self.succeeded().len(),
            self.remaining().len()
        );
        let cancelled = self.cancelled().len();
        if cancelled > 0 {
            summary.push_str(&format!(", {} cancelled", cancelled));
        }
        if let Some(reason) = &self.cancel_reason {
            summary.push_str(&format!(" ({})", reason));
        }
        summary
    }

    fn with_state(&self, pred: impl Fn(WorkerState) -> bool) -> Vec<&Target> {
        self.outcomes
            .iter()
            .filter(|o| pred(o.state))
            .map(|o| &o.target)
            .collect()
    }
}

/// Live snapshot of a coordinator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub running: bool,
    pub pending: usize,
    pub attempting: usize,
    pub succeeded: usize,
    pub cancelled: usize,
    pub exhausted: usize,
    /// Acquisition calls currently awaiting a response.
    pub in_flight: usize,
    pub cancel_reason: Option<CancelReason>,
}
