//! redb-based storage for resources and registration entries
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `resources` | `resource_id` | `Resource` | Bookable resources |
//! | `entries` | `(resource_id, entry_id)` | `RegistrationEntry` | All entries, history included |
//! | `active_entries` | `(resource_id, party_id)` | `entry_id` | At most one active entry per party |
//! | `party_entries` | `(party_id, resource_id, entry_id)` | `()` | Per-party lookup |
//! | `processed_commands` | `command_id` | `CommandResponse` | Idempotent replay |
//!
//! Values are JSON. A [`WriteBatch`] is applied in one write transaction,
//! so an operation's resource row, entries and processed marker become
//! visible together or not at all.

use super::store::{EntryOrder, RegistrationStore, WriteBatch};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use shared::registration::{CommandResponse, EntryStatus, RegistrationEntry, Resource};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const RESOURCES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");

const ENTRIES_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("entries");

const ACTIVE_INDEX_TABLE: TableDefinition<(&str, &str), &str> =
    TableDefinition::new("active_entries");

const PARTY_INDEX_TABLE: TableDefinition<(&str, &str, &str), ()> =
    TableDefinition::new("party_entries");

const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("processed_commands");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend could not be reached (remote stores, test doubles)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Table sizes, for health reporting
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct StorageStats {
    pub resources: u64,
    pub entries: u64,
    pub active_entries: u64,
    pub processed_commands: u64,
}

/// Registration store backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the batch survives a crash.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RESOURCES_TABLE)?;
            let _ = write_txn.open_table(ENTRIES_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_INDEX_TABLE)?;
            let _ = write_txn.open_table(PARTY_INDEX_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;
        Ok(StorageStats {
            resources: read_txn.open_table(RESOURCES_TABLE)?.len()?,
            entries: read_txn.open_table(ENTRIES_TABLE)?.len()?,
            active_entries: read_txn.open_table(ACTIVE_INDEX_TABLE)?.len()?,
            processed_commands: read_txn.open_table(PROCESSED_COMMANDS_TABLE)?.len()?,
        })
    }
}

fn sort_entries(entries: &mut [RegistrationEntry], order: EntryOrder) {
    match order {
        EntryOrder::Position => entries.sort_by(|a, b| {
            a.position
                .unwrap_or(u32::MAX)
                .cmp(&b.position.unwrap_or(u32::MAX))
                .then(a.registered_at.cmp(&b.registered_at))
                .then(a.id.cmp(&b.id))
        }),
        EntryOrder::RegisteredAt => entries.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then(a.id.cmp(&b.id))
        }),
    }
}

impl RegistrationStore for RedbStore {
    fn get_resource(&self, resource_id: &str) -> StorageResult<Option<Resource>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESOURCES_TABLE)?;
        match table.get(resource_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_resources(&self) -> StorageResult<Vec<Resource>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESOURCES_TABLE)?;

        let mut resources = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            resources.push(serde_json::from_slice(value.value())?);
        }
        Ok(resources)
    }

    fn get_entry(
        &self,
        resource_id: &str,
        party_id: &str,
    ) -> StorageResult<Option<RegistrationEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ACTIVE_INDEX_TABLE)?;
        let entry_id = match index.get((resource_id, party_id))? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };

        let table = read_txn.open_table(ENTRIES_TABLE)?;
        match table.get((resource_id, entry_id.as_str()))? {
            Some(value) => {
                let entry: RegistrationEntry = serde_json::from_slice(value.value())?;
                Ok(entry.is_active().then_some(entry))
            }
            None => Ok(None),
        }
    }

    fn get_entry_by_id(
        &self,
        resource_id: &str,
        entry_id: &str,
    ) -> StorageResult<Option<RegistrationEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;
        match table.get((resource_id, entry_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn query_entries(
        &self,
        resource_id: &str,
        statuses: &[EntryStatus],
        order: EntryOrder,
    ) -> StorageResult<Vec<RegistrationEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;

        let mut entries = Vec::new();
        for result in table.range((resource_id, "")..)? {
            let (key, value) = result?;
            if key.value().0 != resource_id {
                break;
            }
            let entry: RegistrationEntry = serde_json::from_slice(value.value())?;
            if statuses.is_empty() || statuses.contains(&entry.status) {
                entries.push(entry);
            }
        }

        sort_entries(&mut entries, order);
        Ok(entries)
    }

    fn entries_for_party(&self, party_id: &str) -> StorageResult<Vec<RegistrationEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(PARTY_INDEX_TABLE)?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;

        let mut entries: Vec<RegistrationEntry> = Vec::new();
        for result in index.range((party_id, "", "")..)? {
            let (key, _value) = result?;
            let (pid, resource_id, entry_id) = key.value();
            if pid != party_id {
                break;
            }
            if let Some(value) = table.get((resource_id, entry_id))? {
                entries.push(serde_json::from_slice(value.value())?);
            }
        }

        entries.sort_by(|a, b| b.registered_at.cmp(&a.registered_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    fn processed_response(&self, command_id: &str) -> StorageResult<Option<CommandResponse>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        match table.get(command_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut resources = write_txn.open_table(RESOURCES_TABLE)?;
            let mut entries = write_txn.open_table(ENTRIES_TABLE)?;
            let mut active = write_txn.open_table(ACTIVE_INDEX_TABLE)?;
            let mut by_party = write_txn.open_table(PARTY_INDEX_TABLE)?;
            let mut processed = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            if let Some(resource) = &batch.resource {
                let value = serde_json::to_vec(resource)?;
                resources.insert(resource.id.as_str(), value.as_slice())?;
            }

            for entry in &batch.entries {
                let value = serde_json::to_vec(entry)?;
                entries.insert((entry.resource_id.as_str(), entry.id.as_str()), value.as_slice())?;
                by_party.insert(
                    (
                        entry.party_id.as_str(),
                        entry.resource_id.as_str(),
                        entry.id.as_str(),
                    ),
                    (),
                )?;

                let key = (entry.resource_id.as_str(), entry.party_id.as_str());
                if entry.is_active() {
                    active.insert(key, entry.id.as_str())?;
                } else {
                    let indexed = active.get(key)?.map(|guard| guard.value().to_string());
                    if indexed.as_deref() == Some(entry.id.as_str()) {
                        active.remove(key)?;
                    }
                }
            }

            if let Some(cmd) = &batch.processed {
                let value = serde_json::to_vec(&cmd.response)?;
                processed.insert(cmd.command_id.as_str(), value.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}
