//! RegistrationManager - per-resource exclusive sections over the store
//!
//! Every state-changing operation runs under the target resource's lock:
//!
//! ```text
//! operation(resource_id, ...)
//!     ├─ 1. Idempotency check (command interface only)
//!     ├─ 2. Lock the resource
//!     ├─ 3. Load ledger + waitlist into a SectionContext
//!     ├─ 4. Execute the action (may promote from the waitlist)
//!     ├─ 5. Build one WriteBatch (+ processed-command marker)
//!     ├─ 6. Commit atomically
//!     ├─ 7. Broadcast events, enqueue notifications
//!     └─ 8. Return result
//! ```
//!
//! A failure before step 6 leaves the store untouched.

mod error;
pub use error::*;

use super::actions::{
    CancelAction, CancelResourceAction, ClaimOfferAction, CommandAction, CompleteResourceAction,
    EndSessionAction, RegisterAction, UpsertResourceAction,
};
use super::clock::{Clock, SystemClock};
use super::locks::ResourceLocks;
use super::notifier::{Notification, NotificationSender};
use super::policy::{PromotionPolicy, RegistrationSettings};
use super::reconcile::{ReconcileReport, reconcile_section};
use super::storage::RedbStore;
use super::store::{EntryOrder, ProcessedCommand, RegistrationStore};
use super::traits::{CommandMetadata, RegistrationHandler, SectionContext, SectionOutcome};
use shared::registration::{
    CommandResponse, EntryStatus, EventPayload, RegistrationCommand, RegistrationEntry,
    RegistrationEvent, Resource, ResourceInput,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Operator recorded for operations the server starts on its own
const SYSTEM_OPERATOR: &str = "system";

/// How a section finds its resource
enum SectionOpen {
    Existing,
    /// Upsert: use the stored row if present, otherwise this one
    CreateIfMissing(Resource),
}

/// Registration coordinator
#[derive(Clone)]
pub struct RegistrationManager {
    store: Arc<dyn RegistrationStore>,
    locks: Arc<ResourceLocks>,
    clock: Arc<dyn Clock>,
    settings: RegistrationSettings,
    event_tx: broadcast::Sender<RegistrationEvent>,
    notify_tx: Option<NotificationSender>,
}

impl std::fmt::Debug for RegistrationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationManager")
            .field("store", &"<RegistrationStore>")
            .field("clock", &self.clock)
            .field("settings", &self.settings)
            .field("locks", &self.locks.len())
            .finish()
    }
}

impl RegistrationManager {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        clock: Arc<dyn Clock>,
        settings: RegistrationSettings,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            locks: Arc::new(ResourceLocks::new()),
            clock,
            settings,
            event_tx,
            notify_tx: None,
        }
    }

    /// Open a redb-backed manager on the system clock
    ///
    /// The clock resumes after the latest stored timestamp.
    pub fn open(db_path: impl AsRef<Path>, settings: RegistrationSettings) -> ManagerResult<Self> {
        let store = RedbStore::open(db_path)?;
        let floor = store.latest_timestamp()?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(SystemClock::resume_after(floor)),
            settings,
        ))
    }

    /// Route notifications into the delivery queue
    pub fn with_notifications(mut self, tx: NotificationSender) -> Self {
        self.notify_tx = Some(tx);
        self
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<RegistrationEvent> {
        self.event_tx.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn RegistrationStore> {
        &self.store
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    // ========================================================================
    // Registration operations
    // ========================================================================

    /// Register a party; confirmed when a slot is free, waitlisted otherwise
    pub fn register(
        &self,
        resource_id: &str,
        party_id: &str,
        party_name: &str,
    ) -> ManagerResult<RegistrationEntry> {
        let action = RegisterAction {
            party_id: party_id.to_string(),
            party_name: party_name.to_string(),
        };
        let entry = self.run_action(resource_id, party_id, &action)?;
        expect_entry(entry, "register")
    }

    /// Cancel the party's active entry and refill a freed slot
    pub fn cancel(&self, resource_id: &str, party_id: &str) -> ManagerResult<RegistrationEntry> {
        let action = CancelAction {
            party_id: party_id.to_string(),
        };
        let entry = self.run_action(resource_id, party_id, &action)?;
        expect_entry(entry, "cancel")
    }

    /// Fill every free slot from the head of the waitlist
    pub fn promote(&self, resource_id: &str) -> ManagerResult<Vec<RegistrationEntry>> {
        self.in_section(resource_id, SectionOpen::Existing, |ctx| {
            Ok(ctx.promote_vacancies())
        })
    }

    /// Close a gap at `from_position` by shifting the entries behind it.
    ///
    /// Only acts when no entry holds `from_position`; on a dense waitlist
    /// this is a no-op. Returns how many entries moved.
    pub fn reorder_waitlist(&self, resource_id: &str, from_position: u32) -> ManagerResult<u32> {
        if from_position == 0 {
            return Err(ManagerError::InvalidOperation(
                "Waitlist positions start at 1".to_string(),
            ));
        }
        self.in_section(resource_id, SectionOpen::Existing, |ctx| {
            if ctx.waitlist().holds(from_position) {
                return Ok(0);
            }
            let shifted = ctx.waitlist_mut().reorder(from_position);
            if shifted > 0 {
                ctx.emit(EventPayload::WaitlistCompacted {
                    from_position,
                    shifted,
                });
            }
            Ok(shifted)
        })
    }

    /// Accept a held equipment offer
    pub fn claim_offer(
        &self,
        resource_id: &str,
        party_id: &str,
    ) -> ManagerResult<RegistrationEntry> {
        let action = ClaimOfferAction {
            party_id: party_id.to_string(),
        };
        let entry = self.run_action(resource_id, party_id, &action)?;
        expect_entry(entry, "claim_offer")
    }

    /// End a confirmed equipment session
    pub fn end_session(
        &self,
        resource_id: &str,
        party_id: &str,
    ) -> ManagerResult<RegistrationEntry> {
        let action = EndSessionAction {
            party_id: party_id.to_string(),
        };
        let entry = self.run_action(resource_id, party_id, &action)?;
        expect_entry(entry, "end_session")
    }

    /// Cancel a class and release every registration on it
    pub fn cancel_resource(&self, resource_id: &str) -> ManagerResult<Resource> {
        self.run_action(resource_id, SYSTEM_OPERATOR, &CancelResourceAction)?;
        self.get_resource(resource_id)
    }

    /// Mark a resource completed
    pub fn complete_resource(&self, resource_id: &str) -> ManagerResult<Resource> {
        self.run_action(resource_id, SYSTEM_OPERATOR, &CompleteResourceAction)?;
        self.get_resource(resource_id)
    }

    /// Create a resource, or update the settings of an existing one
    pub fn upsert_resource(&self, input: ResourceInput) -> ManagerResult<Resource> {
        UpsertResourceAction::validate(&input)?;

        let resource_id = input
            .id
            .clone()
            .unwrap_or_else(shared::util::snowflake_string);
        let now = self.clock.now_millis();
        let mut fresh = Resource::new(&resource_id, input.kind, &input.name, input.capacity);
        fresh.waitlist_enabled = input.waitlist_enabled;
        fresh.waitlist_capacity = input.waitlist_capacity;
        fresh.starts_at = input.starts_at;
        fresh.created_at = now;
        fresh.updated_at = now;

        let action = UpsertResourceAction { input };
        self.in_section(&resource_id, SectionOpen::CreateIfMissing(fresh), |ctx| {
            let metadata = CommandMetadata::direct(SYSTEM_OPERATOR, ctx.now());
            action.execute(ctx, &metadata)
        })?;
        self.get_resource(&resource_id)
    }

    /// Expire every offer past its claim deadline and pass the slots on.
    ///
    /// Returns the number of expired offers. A failing resource is logged
    /// and skipped so one bad row does not stall the sweep.
    pub fn expire_offers(&self) -> ManagerResult<u32> {
        let now = self.clock.now_millis();
        let mut expired = 0;
        for resource in self.store.list_resources()? {
            if !matches!(
                self.settings.policy_for(resource.kind),
                PromotionPolicy::ClaimWindow { .. }
            ) {
                continue;
            }
            let due = self
                .store
                .query_entries(&resource.id, &[EntryStatus::Offered], EntryOrder::RegisteredAt)?
                .iter()
                .any(|e| e.offer_expires_at.is_some_and(|t| t < now));
            if !due {
                continue;
            }

            match self.in_section(&resource.id, SectionOpen::Existing, |ctx| {
                ctx.expire_due_offers()
            }) {
                Ok(count) => expired += count,
                Err(e) => {
                    tracing::error!(resource_id = %resource.id, error = %e, "Offer expiry failed")
                }
            }
        }
        if expired > 0 {
            tracing::info!(expired, "Expired unclaimed offers");
        }
        Ok(expired)
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Recompute the occupied count and waitlist positions of one resource
    pub fn reconcile(&self, resource_id: &str) -> ManagerResult<ReconcileReport> {
        self.in_section(resource_id, SectionOpen::Existing, reconcile_section)
    }

    /// Reconcile every resource; returns one report per resource
    pub fn reconcile_all(&self) -> ManagerResult<Vec<ReconcileReport>> {
        let resources = self.store.list_resources()?;
        let mut reports = Vec::with_capacity(resources.len());
        for resource in resources {
            match self.reconcile(&resource.id) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!(resource_id = %resource.id, error = %e, "Reconciliation failed")
                }
            }
        }
        Ok(reports)
    }

    // ========================================================================
    // Command interface
    // ========================================================================

    /// Execute a command and return the response
    ///
    /// Replaying a committed `command_id` returns the stored response with
    /// `duplicate` set. Rejected commands are not recorded and may be retried.
    pub fn execute_command(&self, cmd: RegistrationCommand) -> CommandResponse {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd) {
            Ok(response) => response,
            Err(err) => CommandResponse::error(command_id, err.into()),
        }
    }

    fn process_command(&self, cmd: RegistrationCommand) -> ManagerResult<CommandResponse> {
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        // 1. Idempotency check (before locking)
        if let Some(stored) = self.store.processed_response(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok(stored.into_duplicate());
        }

        // 2. Exclusive section
        let resource_id = cmd.resource_id().to_string();
        let lock = self.locks.lock_for(&resource_id);
        let _guard = lock.lock();

        // Double-check idempotency within the section
        if let Some(stored) = self.store.processed_response(&cmd.command_id)? {
            return Ok(stored.into_duplicate());
        }

        // 3. Load and execute
        let mut ctx = self.open_section(&resource_id, SectionOpen::Existing)?;
        let metadata = CommandMetadata {
            command_id: Some(cmd.command_id.clone()),
            operator_id: cmd.operator_id.clone(),
            timestamp: cmd.timestamp,
        };
        let action = CommandAction::from(&cmd.payload);
        let entry = action.execute(&mut ctx, &metadata)?;

        // 4. Response is stored with the writes
        let mut outcome = ctx.finish();
        let response = match outcome.error.take() {
            None => CommandResponse::success(cmd.command_id.clone(), entry),
            Some(err) => CommandResponse::error(cmd.command_id.clone(), err.into()),
        };
        outcome.batch.processed = Some(ProcessedCommand {
            command_id: cmd.command_id.clone(),
            response: response.clone(),
        });

        // 5. Commit and publish
        self.commit_outcome(&resource_id, Some(&cmd.command_id), outcome)?;
        Ok(response)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_resource(&self, resource_id: &str) -> ManagerResult<Resource> {
        self.store
            .get_resource(resource_id)?
            .ok_or_else(|| ManagerError::ResourceNotFound(resource_id.to_string()))
    }

    pub fn list_resources(&self) -> ManagerResult<Vec<Resource>> {
        Ok(self.store.list_resources()?)
    }

    /// Active entry of a party on a resource, if any
    pub fn get_active_entry(
        &self,
        resource_id: &str,
        party_id: &str,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        Ok(self.store.get_entry(resource_id, party_id)?)
    }

    /// Entries of a resource in `statuses` (all when empty), oldest first
    pub fn list_entries(
        &self,
        resource_id: &str,
        statuses: &[EntryStatus],
    ) -> ManagerResult<Vec<RegistrationEntry>> {
        self.get_resource(resource_id)?;
        Ok(self
            .store
            .query_entries(resource_id, statuses, EntryOrder::RegisteredAt)?)
    }

    /// Waitlisted entries ordered by position
    pub fn waitlist(&self, resource_id: &str) -> ManagerResult<Vec<RegistrationEntry>> {
        self.get_resource(resource_id)?;
        Ok(self.store.query_entries(
            resource_id,
            &[EntryStatus::Waitlisted],
            EntryOrder::Position,
        )?)
    }

    /// Every entry of a party across resources, newest first
    pub fn entries_for_party(&self, party_id: &str) -> ManagerResult<Vec<RegistrationEntry>> {
        Ok(self.store.entries_for_party(party_id)?)
    }

    // ========================================================================
    // Section plumbing
    // ========================================================================

    fn run_action(
        &self,
        resource_id: &str,
        operator_id: &str,
        action: &impl RegistrationHandler,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        self.in_section(resource_id, SectionOpen::Existing, |ctx| {
            let metadata = CommandMetadata::direct(operator_id, ctx.now());
            action.execute(ctx, &metadata)
        })
    }

    /// Run `op` under the resource lock and commit what it staged
    fn in_section<T>(
        &self,
        resource_id: &str,
        open: SectionOpen,
        op: impl FnOnce(&mut SectionContext<'_>) -> ManagerResult<T>,
    ) -> ManagerResult<T> {
        let lock = self.locks.lock_for(resource_id);
        let _guard = lock.lock();

        let mut ctx = self.open_section(resource_id, open)?;
        let value = op(&mut ctx)?;
        match self.commit_outcome(resource_id, None, ctx.finish())? {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }

    fn open_section(&self, resource_id: &str, open: SectionOpen) -> ManagerResult<SectionContext<'_>> {
        let now = self.clock.now_millis();
        let store = self.store.as_ref();
        match open {
            SectionOpen::Existing => SectionContext::load(store, resource_id, now, &self.settings),
            SectionOpen::CreateIfMissing(resource) => {
                if store.get_resource(resource_id)?.is_some() {
                    SectionContext::load(store, resource_id, now, &self.settings)
                } else {
                    Ok(SectionContext::create(store, resource, now, &self.settings))
                }
            }
        }
    }

    /// Commit a finished section, then publish its events and notifications.
    ///
    /// Returns the error the section deferred until after its commit.
    fn commit_outcome(
        &self,
        resource_id: &str,
        command_id: Option<&str>,
        outcome: SectionOutcome,
    ) -> ManagerResult<Option<ManagerError>> {
        let SectionOutcome {
            batch,
            events,
            notifications,
            error,
            timestamp,
        } = outcome;

        if !batch.is_empty() {
            let writes = batch.entries.len();
            self.store.commit(batch)?;
            tracing::debug!(resource_id = %resource_id, writes, "Section committed");
        }

        self.publish(resource_id, command_id, timestamp, events, notifications);
        Ok(error)
    }

    fn publish(
        &self,
        resource_id: &str,
        command_id: Option<&str>,
        timestamp: i64,
        events: Vec<EventPayload>,
        notifications: Vec<Notification>,
    ) {
        for payload in events {
            let event = RegistrationEvent::new(
                resource_id,
                timestamp,
                command_id.map(str::to_string),
                payload,
            );
            if self.event_tx.send(event).is_err() {
                tracing::trace!("Event broadcast skipped: no active receivers");
                break;
            }
        }

        if notifications.is_empty() {
            return;
        }
        let Some(tx) = &self.notify_tx else {
            tracing::debug!(
                count = notifications.len(),
                "No notification queue configured, dropping notifications"
            );
            return;
        };
        for notification in notifications {
            if tx.send(notification).is_err() {
                tracing::warn!("Notification queue closed, dropping notifications");
                break;
            }
        }
    }
}

fn expect_entry(
    entry: Option<RegistrationEntry>,
    operation: &str,
) -> ManagerResult<RegistrationEntry> {
    entry.ok_or_else(|| {
        ManagerError::InvalidOperation(format!("{} completed without an entry", operation))
    })
}

#[cfg(test)]
mod tests;
