use super::*;
use crate::registration::clock::ManualClock;
use crate::registration::notifier::Notification;
use crate::registration::storage::{RedbStore, StorageError, StorageResult};
use crate::registration::store::WriteBatch;
use shared::registration::{
    CommandErrorCode, RegistrationCommandPayload, ResourceKind, ResourceStatus,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

const T0: i64 = 1_700_000_000_000;

struct TestHarness {
    manager: RegistrationManager,
    clock: Arc<ManualClock>,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl TestHarness {
    /// Drain every notification enqueued so far
    fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }
}

fn create_test_manager() -> TestHarness {
    let store = RedbStore::open_in_memory().unwrap();
    harness_with_store(Arc::new(store))
}

fn harness_with_store(store: Arc<dyn RegistrationStore>) -> TestHarness {
    let clock = Arc::new(ManualClock::new(T0));
    let (tx, rx) = mpsc::unbounded_channel();
    let manager = RegistrationManager::new(store, clock.clone(), RegistrationSettings::default())
        .with_notifications(tx);
    TestHarness {
        manager,
        clock,
        notifications: rx,
    }
}

fn resource_input(id: &str, kind: ResourceKind, capacity: u32) -> ResourceInput {
    ResourceInput {
        id: Some(id.to_string()),
        kind,
        name: format!("{} session", id),
        capacity,
        waitlist_enabled: true,
        waitlist_capacity: None,
        starts_at: None,
    }
}

fn create_class(manager: &RegistrationManager, id: &str, capacity: u32) -> Resource {
    manager
        .upsert_resource(resource_input(id, ResourceKind::Class, capacity))
        .unwrap()
}

fn create_equipment(manager: &RegistrationManager, id: &str, capacity: u32) -> Resource {
    manager
        .upsert_resource(resource_input(id, ResourceKind::Equipment, capacity))
        .unwrap()
}

/// Register parties in order, one millisecond apart
fn register_all(h: &TestHarness, resource_id: &str, parties: &[&str]) -> Vec<RegistrationEntry> {
    parties
        .iter()
        .map(|p| {
            h.clock.advance(1);
            h.manager.register(resource_id, p, &p.to_uppercase()).unwrap()
        })
        .collect()
}

/// Waitlist as (party, position) pairs in position order
fn waitlist_of(manager: &RegistrationManager, resource_id: &str) -> Vec<(String, u32)> {
    manager
        .waitlist(resource_id)
        .unwrap()
        .into_iter()
        .map(|e| (e.party_id, e.position.unwrap_or(0)))
        .collect()
}

fn active_status(manager: &RegistrationManager, resource_id: &str, party_id: &str) -> Option<EntryStatus> {
    manager
        .get_active_entry(resource_id, party_id)
        .unwrap()
        .map(|e| e.status)
}

/// Invariants that must hold after every operation
fn assert_invariants(manager: &RegistrationManager, resource_id: &str) {
    let resource = manager.get_resource(resource_id).unwrap();
    let entries = manager.list_entries(resource_id, &[]).unwrap();

    let holders = entries.iter().filter(|e| e.status.holds_slot()).count() as u32;
    assert!(holders <= resource.capacity, "capacity exceeded: {holders} > {}", resource.capacity);
    assert_eq!(resource.occupied, holders, "occupied out of sync");

    let mut positions: Vec<u32> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Waitlisted)
        .map(|e| e.position.expect("waitlisted entry without position"))
        .collect();
    positions.sort_unstable();
    let expected: Vec<u32> = (1..=positions.len() as u32).collect();
    assert_eq!(positions, expected, "waitlist positions not dense");

    for e in entries.iter().filter(|e| e.status != EntryStatus::Waitlisted) {
        assert!(e.position.is_none(), "{} carries a stray position", e.id);
    }

    let mut parties = HashSet::new();
    for e in entries.iter().filter(|e| e.is_active()) {
        assert!(parties.insert(e.party_id.clone()), "{} has two active entries", e.party_id);
    }
}

/// Store that can be told to fail every commit
struct FlakyStore {
    inner: RedbStore,
    fail_commits: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: RedbStore::open_in_memory().unwrap(),
            fail_commits: AtomicBool::new(false),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.fail_commits.store(failing, Ordering::SeqCst);
    }
}

impl RegistrationStore for FlakyStore {
    fn get_resource(&self, resource_id: &str) -> StorageResult<Option<Resource>> {
        self.inner.get_resource(resource_id)
    }

    fn list_resources(&self) -> StorageResult<Vec<Resource>> {
        self.inner.list_resources()
    }

    fn get_entry(&self, resource_id: &str, party_id: &str) -> StorageResult<Option<RegistrationEntry>> {
        self.inner.get_entry(resource_id, party_id)
    }

    fn get_entry_by_id(&self, resource_id: &str, entry_id: &str) -> StorageResult<Option<RegistrationEntry>> {
        self.inner.get_entry_by_id(resource_id, entry_id)
    }

    fn query_entries(
        &self,
        resource_id: &str,
        statuses: &[EntryStatus],
        order: EntryOrder,
    ) -> StorageResult<Vec<RegistrationEntry>> {
        self.inner.query_entries(resource_id, statuses, order)
    }

    fn entries_for_party(&self, party_id: &str) -> StorageResult<Vec<RegistrationEntry>> {
        self.inner.entries_for_party(party_id)
    }

    fn processed_response(&self, command_id: &str) -> StorageResult<Option<CommandResponse>> {
        self.inner.processed_response(command_id)
    }

    fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected outage".to_string()));
        }
        self.inner.commit(batch)
    }
}

mod test_offers;
mod test_reconcile;
mod test_waitlist;
