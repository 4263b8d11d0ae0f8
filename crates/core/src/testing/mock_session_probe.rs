//! Mock session probe for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::AuthContext;
use crate::client::{ProbeStatus, SessionProbe};

/// Mock implementation of the SessionProbe trait.
///
/// Returns queued statuses first, then the default status.
#[derive(Debug, Clone)]
pub struct MockSessionProbe {
    queued: Arc<RwLock<VecDeque<ProbeStatus>>>,
    default_status: Arc<RwLock<ProbeStatus>>,
    probes: Arc<AtomicUsize>,
}

impl Default for MockSessionProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionProbe {
    /// Create a probe that always reports a valid session.
    pub fn new() -> Self {
        Self {
            queued: Arc::new(RwLock::new(VecDeque::new())),
            default_status: Arc::new(RwLock::new(ProbeStatus::Valid(None))),
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a status for the next probe.
    pub async fn push(&self, status: ProbeStatus) {
        self.queued.write().await.push_back(status);
    }

    /// Change the status returned when the queue is empty.
    pub async fn set_default(&self, status: ProbeStatus) {
        *self.default_status.write().await = status;
    }

    /// Number of probes performed.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProbe for MockSessionProbe {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, _auth: &AuthContext) -> ProbeStatus {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let queued = self.queued.write().await.pop_front();
        match queued {
            Some(status) => status,
            None => self.default_status.read().await.clone(),
        }
    }
}
