//! In-memory target store for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::target::{Target, TargetError, TargetStore};

/// Target store kept in memory, counting removals per id.
#[derive(Debug, Clone, Default)]
pub struct MemoryTargetStore {
    targets: Arc<RwLock<BTreeMap<String, Target>>>,
    removals: Arc<RwLock<HashMap<String, usize>>>,
}

impl MemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `targets`.
    pub fn with_targets(targets: Vec<Target>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.targets.write() {
            for target in targets {
                map.insert(target.id.clone(), target);
            }
        }
        store
    }

    /// Number of `remove` calls made for `id`, successful or not.
    pub fn removals(&self, id: &str) -> usize {
        self.removals
            .read()
            .map(|r| r.get(id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.targets
            .read()
            .map(|t| t.contains_key(id))
            .unwrap_or(false)
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> TargetError {
        TargetError::Database(format!("lock poisoned: {}", e))
    }
}

impl TargetStore for MemoryTargetStore {
    fn list(&self) -> Result<Vec<Target>, TargetError> {
        let targets = self.targets.read().map_err(Self::lock_error)?;
        Ok(targets.values().cloned().collect())
    }

    fn get(&self, id: &str) -> Result<Option<Target>, TargetError> {
        let targets = self.targets.read().map_err(Self::lock_error)?;
        Ok(targets.get(id).cloned())
    }

    fn save(&self, target: &Target) -> Result<(), TargetError> {
        let mut targets = self.targets.write().map_err(Self::lock_error)?;
        targets.insert(target.id.clone(), target.clone());
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), TargetError> {
        *self
            .removals
            .write()
            .map_err(Self::lock_error)?
            .entry(id.to_string())
            .or_insert(0) += 1;

        let mut targets = self.targets.write().map_err(Self::lock_error)?;
        match targets.remove(id) {
            Some(_) => Ok(()),
            None => Err(TargetError::NotFound(id.to_string())),
        }
    }
}
