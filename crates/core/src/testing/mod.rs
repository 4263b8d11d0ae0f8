//! Testing utilities and mock implementations.
//!
//! Mock implementations of the engine's collaborator traits, so runs can be
//! exercised without a live course-selection service.
//!
//! # Example
//!
//! ```rust,ignore
//! use seatgrab_core::testing::{fixtures, MemoryTargetStore, MockResourceClient};
//!
//! let client = MockResourceClient::new();
//! client.script("A", vec![AttemptOutcome::Rejected("full".into()), AttemptOutcome::Success]).await;
//!
//! let store = MemoryTargetStore::with_targets(vec![fixtures::target("A")]);
//! // Hand both to an AcquisitionCoordinator...
//! ```

mod memory_store;
mod mock_resource_client;
mod mock_session_probe;

pub use memory_store::MemoryTargetStore;
pub use mock_resource_client::{MockResourceClient, RecordedAttempt};
pub use mock_session_probe::MockSessionProbe;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::auth::AuthContext;
    use crate::target::{ClazzType, Target};

    /// Create a test target with reasonable defaults.
    pub fn target(id: &str) -> Target {
        Target::new(
            id,
            format!("secret-{}", id),
            format!("Course {}", id),
            ClazzType::InPlan,
        )
        .with_teacher("Dr. Test")
    }

    /// Create `count` targets with ids `T0`, `T1`, ...
    pub fn targets(count: usize) -> Vec<Target> {
        (0..count).map(|i| target(&format!("T{}", i))).collect()
    }

    /// Create a test auth context.
    pub fn auth() -> Arc<AuthContext> {
        let mut cookies = BTreeMap::new();
        cookies.insert("JSESSIONID".to_string(), "test-session".to_string());
        Arc::new(AuthContext::new("test-token", cookies, "batch-1"))
    }
}
