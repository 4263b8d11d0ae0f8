//! Target storage trait and error type.

use thiserror::Error;

use super::Target;

/// Error type for target store operations.
#[derive(Debug, Error)]
pub enum TargetError {
    /// Target not found.
    #[error("Target not found: {0}")]
    NotFound(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A descriptor could not be decoded or encoded.
    #[error("Invalid target descriptor {path}: {reason}")]
    Parse { path: String, reason: String },

    /// The id cannot be used as a descriptor file name.
    #[error("Invalid target id {0:?}: only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidId(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Durable list of target descriptors.
///
/// The engine only calls [`TargetStore::remove`], once per acquired target;
/// the front end uses the rest to manage the list between runs.
pub trait TargetStore: Send + Sync {
    /// All stored targets, ordered by id.
    fn list(&self) -> Result<Vec<Target>, TargetError>;

    /// Get a target by id.
    fn get(&self, id: &str) -> Result<Option<Target>, TargetError>;

    /// Insert or replace a target.
    fn save(&self, target: &Target) -> Result<(), TargetError>;

    /// Remove a target. Returns `TargetError::NotFound` if it is absent.
    fn remove(&self, id: &str) -> Result<(), TargetError>;
}
