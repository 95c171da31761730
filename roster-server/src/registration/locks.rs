//! Per-resource exclusive sections

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// One mutex per resource id.
///
/// Operations on the same resource are serialized; different resources
/// never contend. Entries are never removed: a removed mutex could still be
/// held through a cloned `Arc` while a new one is created for the same id.
#[derive(Debug, Default)]
pub struct ResourceLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutex guarding `resource_id`
    pub fn lock_for(&self, resource_id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(resource_id) {
            return lock.clone();
        }
        self.locks
            .entry(resource_id.to_string())
            .or_default()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
