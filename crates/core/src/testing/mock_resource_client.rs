//! Mock resource client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::auth::AuthContext;
use crate::client::{AttemptOutcome, ResourceClient};
use crate::target::Target;

/// A recorded acquisition call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    /// Id of the target attempted.
    pub target_id: String,
    /// When the call started.
    pub at: Instant,
}

/// Mock implementation of the ResourceClient trait.
///
/// Provides controllable behavior for testing:
/// - Scripted outcome queues per target (falls back to a default outcome)
/// - Recorded calls with start instants
/// - High-water mark of concurrent calls
/// - Optional per-call latency
#[derive(Clone)]
pub struct MockResourceClient {
    scripts: Arc<RwLock<HashMap<String, VecDeque<AttemptOutcome>>>>,
    default_outcome: Arc<RwLock<AttemptOutcome>>,
    calls: Arc<RwLock<Vec<RecordedAttempt>>>,
    delay: Arc<RwLock<Duration>>,
    target_delays: Arc<RwLock<HashMap<String, Duration>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MockResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockResourceClient")
            .field("max_in_flight", &self.max_concurrency())
            .finish_non_exhaustive()
    }
}

impl Default for MockResourceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResourceClient {
    /// Create a mock that rejects every attempt unless scripted otherwise.
    pub fn new() -> Self {
        Self::with_default(AttemptOutcome::Rejected("class is full".to_string()))
    }

    /// Create a mock returning `outcome` for unscripted attempts.
    pub fn with_default(outcome: AttemptOutcome) -> Self {
        Self {
            scripts: Arc::new(RwLock::new(HashMap::new())),
            default_outcome: Arc::new(RwLock::new(outcome)),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            target_delays: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue outcomes for a target; consumed in order before the default applies.
    pub async fn script(&self, target_id: &str, outcomes: Vec<AttemptOutcome>) {
        self.scripts
            .write()
            .await
            .entry(target_id.to_string())
            .or_default()
            .extend(outcomes);
    }

    /// Change the outcome returned once a target's script is drained.
    pub async fn set_default(&self, outcome: AttemptOutcome) {
        *self.default_outcome.write().await = outcome;
    }

    /// Make every call take `delay` before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Override the call latency for one target.
    pub async fn set_delay_for(&self, target_id: &str, delay: Duration) {
        self.target_delays
            .write()
            .await
            .insert(target_id.to_string(), delay);
    }

    /// Get all recorded calls.
    pub async fn calls(&self) -> Vec<RecordedAttempt> {
        self.calls.read().await.clone()
    }

    /// Number of calls made for one target.
    pub async fn calls_for(&self, target_id: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.target_id == target_id)
            .count()
    }

    /// Start instants of the calls made for one target.
    pub async fn call_times(&self, target_id: &str) -> Vec<Instant> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.target_id == target_id)
            .map(|c| c.at)
            .collect()
    }

    /// Highest number of calls ever in flight at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceClient for MockResourceClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn attempt(&self, target: &Target, _auth: &AuthContext) -> AttemptOutcome {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.calls.write().await.push(RecordedAttempt {
            target_id: target.id.clone(),
            at: Instant::now(),
        });

        let delay = match self.target_delays.read().await.get(&target.id) {
            Some(delay) => *delay,
            None => *self.delay.read().await,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .scripts
            .write()
            .await
            .get_mut(&target.id)
            .and_then(|queue| queue.pop_front());
        let outcome = match scripted {
            Some(outcome) => outcome,
            None => self.default_outcome.read().await.clone(),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}
