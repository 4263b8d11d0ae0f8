//! Types for acquisition attempts and session probes.

use std::fmt;

use async_trait::async_trait;

use crate::auth::AuthContext;
use crate::target::Target;

/// Classified result of one acquisition call.
///
/// Returned by value: every call site has to handle all four kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The seat was acquired.
    Success,
    /// Business-level rejection (capacity full, not yet open, ...). Retryable.
    Rejected(String),
    /// Transport or parse failure. Retryable.
    TransientError(String),
    /// The session is no longer accepted. Fatal for the whole run.
    AuthExpired,
}

impl AttemptOutcome {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Rejected(_) => "rejected",
            AttemptOutcome::TransientError(_) => "transient",
            AttemptOutcome::AuthExpired => "auth_expired",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AttemptOutcome::Rejected(_) | AttemptOutcome::TransientError(_)
        )
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Success => write!(f, "success"),
            AttemptOutcome::Rejected(reason) => write!(f, "rejected: {}", reason),
            AttemptOutcome::TransientError(detail) => write!(f, "transient error: {}", detail),
            AttemptOutcome::AuthExpired => write!(f, "session expired"),
        }
    }
}

/// Server status returned by the keep-alive endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heartbeat {
    pub server_time: Option<String>,
    pub online_count: Option<u64>,
}

/// Result of a session validity probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The session is accepted.
    Valid(Option<Heartbeat>),
    /// The service rejected the session.
    Invalid(String),
    /// The service could not be reached; says nothing about the session.
    Unreachable(String),
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Valid(_) => "valid",
            ProbeStatus::Invalid(_) => "invalid",
            ProbeStatus::Unreachable(_) => "unreachable",
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ProbeStatus::Invalid(_))
    }
}

/// Performs single acquisition attempts against the remote service.
///
/// Implementations never retry internally and must bound every call with a
/// timeout; retry policy belongs to the worker.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Name of this client implementation.
    fn name(&self) -> &str;

    /// Send one acquisition request for `target`.
    async fn attempt(&self, target: &Target, auth: &AuthContext) -> AttemptOutcome;
}

/// Lightweight session check that never touches the contested resource.
#[async_trait]
pub trait SessionProbe: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self, auth: &AuthContext) -> ProbeStatus;
}
