//! Store capability consumed by the registration manager
//!
//! Point reads, filtered scans and one atomic batch write. The manager
//! never writes piecemeal: everything an operation changes is submitted as
//! a single [`WriteBatch`], which the store applies all-or-nothing.

use super::storage::StorageResult;
use shared::registration::{CommandResponse, EntryStatus, RegistrationEntry, Resource};

/// Ordering for [`RegistrationStore::query_entries`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrder {
    /// Waitlist position ascending, entries without a position last
    Position,
    /// Registration time ascending, entry id as tie-break
    RegisteredAt,
}

/// Response recorded for an idempotent command
#[derive(Debug, Clone)]
pub struct ProcessedCommand {
    pub command_id: String,
    pub response: CommandResponse,
}

/// Writes of one operation
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub resource: Option<Resource>,
    pub entries: Vec<RegistrationEntry>,
    pub processed: Option<ProcessedCommand>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_entry(mut self, entry: RegistrationEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.resource.is_none() && self.entries.is_empty() && self.processed.is_none()
    }
}

pub trait RegistrationStore: Send + Sync {
    fn get_resource(&self, resource_id: &str) -> StorageResult<Option<Resource>>;

    fn list_resources(&self) -> StorageResult<Vec<Resource>>;

    /// Active (confirmed, waitlisted or offered) entry of a party
    fn get_entry(&self, resource_id: &str, party_id: &str)
    -> StorageResult<Option<RegistrationEntry>>;

    fn get_entry_by_id(
        &self,
        resource_id: &str,
        entry_id: &str,
    ) -> StorageResult<Option<RegistrationEntry>>;

    /// Entries of a resource whose status is in `statuses` (all when empty)
    fn query_entries(
        &self,
        resource_id: &str,
        statuses: &[EntryStatus],
        order: EntryOrder,
    ) -> StorageResult<Vec<RegistrationEntry>>;

    /// Every entry of a party across resources, newest first
    fn entries_for_party(&self, party_id: &str) -> StorageResult<Vec<RegistrationEntry>>;

    /// Stored response of an already committed command
    fn processed_response(&self, command_id: &str) -> StorageResult<Option<CommandResponse>>;

    /// Apply every write of `batch` atomically
    fn commit(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Latest recorded timestamp (registration, promotion, cancel, end or
    /// resource update), 0 for an empty store
    fn latest_timestamp(&self) -> StorageResult<i64> {
        let mut latest = 0;
        for resource in self.list_resources()? {
            latest = latest.max(resource.updated_at);
            for entry in self.query_entries(&resource.id, &[], EntryOrder::RegisteredAt)? {
                let stamps = [entry.promoted_at, entry.canceled_at, entry.ended_at];
                latest = stamps
                    .into_iter()
                    .flatten()
                    .fold(latest.max(entry.registered_at), i64::max);
            }
        }
        Ok(latest)
    }

    fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        Ok(self.processed_response(command_id)?.is_some())
    }

    fn put_resource(&self, resource: &Resource) -> StorageResult<()> {
        self.commit(WriteBatch::new().with_resource(resource.clone()))
    }

    fn put_entry(&self, entry: &RegistrationEntry) -> StorageResult<()> {
        self.commit(WriteBatch::new().with_entry(entry.clone()))
    }
}
