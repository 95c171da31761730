//! Capacity ledger
//!
//! Custodian of one resource's occupied-slot count. Every change to
//! `occupied` goes through [`CapacityLedger::increment`] (or the
//! reconciliation recount) inside the resource's exclusive section; the
//! resulting resource row is written in the same commit as the entries.

use shared::registration::{Resource, ResourceInput, ResourceStatus};

#[derive(Debug, Clone)]
pub struct CapacityLedger {
    resource: Resource,
    dirty: bool,
}

impl CapacityLedger {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            dirty: false,
        }
    }

    /// Ledger for a resource that does not exist in the store yet
    pub fn new_resource(resource: Resource) -> Self {
        Self {
            resource,
            dirty: true,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn occupied(&self) -> u32 {
        self.resource.occupied
    }

    pub fn capacity(&self) -> u32 {
        self.resource.capacity
    }

    pub fn has_vacancy(&self) -> bool {
        self.resource.has_vacancy()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply `delta` to the occupied count and return the new count.
    ///
    /// A result below zero is clamped to zero and logged: it means some
    /// earlier write was lost, not a valid business state.
    pub fn increment(&mut self, delta: i64) -> u32 {
        let next = i64::from(self.resource.occupied) + delta;
        let clamped = if next < 0 {
            tracing::error!(
                resource_id = %self.resource.id,
                occupied = self.resource.occupied,
                delta,
                "Capacity ledger inconsistency: occupied count would go negative, clamping to 0"
            );
            0
        } else {
            u32::try_from(next).unwrap_or(u32::MAX)
        };
        self.resource.occupied = clamped;
        self.dirty = true;
        clamped
    }

    /// Overwrite the occupied count with a recount from entries.
    ///
    /// Returns the previous value when it differed.
    pub fn recount(&mut self, actual: u32) -> Option<u32> {
        if self.resource.occupied == actual {
            return None;
        }
        let before = self.resource.occupied;
        self.resource.occupied = actual;
        self.dirty = true;
        Some(before)
    }

    pub fn set_status(&mut self, status: ResourceStatus) {
        if self.resource.status != status {
            self.resource.status = status;
            self.dirty = true;
        }
    }

    /// Apply administrative settings; kind and occupied count are kept
    pub fn apply_settings(&mut self, input: &ResourceInput) {
        let r = &mut self.resource;
        r.name = input.name.clone();
        r.capacity = input.capacity;
        r.waitlist_enabled = input.waitlist_enabled;
        r.waitlist_capacity = input.waitlist_capacity;
        r.starts_at = input.starts_at;
        self.dirty = true;
    }

    /// Resource row to persist, stamped with `now`
    pub fn finish(mut self, now: i64) -> Option<Resource> {
        if !self.dirty {
            return None;
        }
        self.resource.updated_at = now;
        Some(self.resource)
    }
}
