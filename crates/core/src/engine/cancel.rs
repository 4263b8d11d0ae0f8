//! Run-wide cooperative cancellation.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::metrics::CANCELLATIONS_TOTAL;

/// Why a run was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CancelReason {
    /// An attempt for `target` reported the session as expired.
    AuthExpired { target: String },
    /// The session monitor found the session invalid.
    SessionInvalid { reason: String },
    /// Interrupted by the operator.
    Operator,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::AuthExpired { .. } => "auth_expired",
            CancelReason::SessionInvalid { .. } => "session_invalid",
            CancelReason::Operator => "operator",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::AuthExpired { target } => {
                write!(f, "session expired while attempting {}", target)
            }
            CancelReason::SessionInvalid { reason } => {
                write!(f, "session reported invalid: {}", reason)
            }
            CancelReason::Operator => f.write_str("interrupted by operator"),
        }
    }
}

/// Shared cancellation flag for one run.
///
/// Raised at most once; the first reason wins and later raises are no-ops.
/// Workers check it before each iteration and while sleeping, never during
/// an in-flight call.
#[derive(Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` only for the call that raised it.
    pub fn raise(&self, reason: CancelReason) -> bool {
        let label = reason.as_str();
        if self.reason.set(reason).is_err() {
            return false;
        }
        CANCELLATIONS_TOTAL.with_label_values(&[label]).inc();
        self.token.cancel();
        true
    }

    pub fn is_raised(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().cloned()
    }

    /// Resolves once the signal is raised.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("raised", &self.is_raised())
            .field("reason", &self.reason.get())
            .finish()
    }
}
