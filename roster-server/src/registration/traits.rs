//! Exclusive-section context and the handler trait
//!
//! A [`SectionContext`] is the unit of work for one resource. The manager
//! opens it while holding the resource lock: the resource row is loaded into
//! a [`CapacityLedger`] and the waitlisted entries into an
//! [`OrderedWaitlist`]. Handlers mutate the context only; nothing reaches
//! the store until the manager turns the context into a single
//! [`WriteBatch`] and commits it.

use super::ledger::CapacityLedger;
use super::manager::{ManagerError, ManagerResult};
use super::notifier::Notification;
use super::policy::{PromotionPolicy, RegistrationSettings, VacancyTrigger, accepts_trigger};
use super::store::{EntryOrder, RegistrationStore, WriteBatch};
use super::waitlist::OrderedWaitlist;
use shared::registration::{EntryStatus, EventPayload, RegistrationEntry, Resource};
use std::collections::{BTreeMap, HashSet};

/// Who issued an operation and under which idempotency key
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: Option<String>,
    pub operator_id: String,
    pub timestamp: i64,
}

impl CommandMetadata {
    /// Metadata for a direct (non-command) call
    pub fn direct(operator_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            command_id: None,
            operator_id: operator_id.into(),
            timestamp,
        }
    }
}

/// Everything an exclusive section produced
#[derive(Debug)]
pub struct SectionOutcome {
    pub batch: WriteBatch,
    pub events: Vec<EventPayload>,
    pub notifications: Vec<Notification>,
    /// Error to report after the batch is committed
    pub error: Option<ManagerError>,
    pub timestamp: i64,
}

pub struct SectionContext<'a> {
    store: &'a dyn RegistrationStore,
    now: i64,
    policy: PromotionPolicy,
    ledger: CapacityLedger,
    waitlist: OrderedWaitlist,
    touched: BTreeMap<String, RegistrationEntry>,
    events: Vec<EventPayload>,
    notifications: Vec<Notification>,
    deferred_error: Option<ManagerError>,
}

impl<'a> SectionContext<'a> {
    /// Open a section on an existing resource
    pub fn load(
        store: &'a dyn RegistrationStore,
        resource_id: &str,
        now: i64,
        settings: &RegistrationSettings,
    ) -> ManagerResult<Self> {
        let resource = store
            .get_resource(resource_id)?
            .ok_or_else(|| ManagerError::ResourceNotFound(resource_id.to_string()))?;
        let waitlisted =
            store.query_entries(resource_id, &[EntryStatus::Waitlisted], EntryOrder::Position)?;
        Ok(Self::build(
            store,
            CapacityLedger::new(resource),
            OrderedWaitlist::load(waitlisted),
            now,
            settings,
        ))
    }

    /// Open a section on a resource that is not stored yet
    pub fn create(
        store: &'a dyn RegistrationStore,
        resource: Resource,
        now: i64,
        settings: &RegistrationSettings,
    ) -> Self {
        Self::build(
            store,
            CapacityLedger::new_resource(resource),
            OrderedWaitlist::default(),
            now,
            settings,
        )
    }

    fn build(
        store: &'a dyn RegistrationStore,
        ledger: CapacityLedger,
        waitlist: OrderedWaitlist,
        now: i64,
        settings: &RegistrationSettings,
    ) -> Self {
        Self {
            store,
            now,
            policy: settings.policy_for(ledger.resource().kind),
            ledger,
            waitlist,
            touched: BTreeMap::new(),
            events: Vec::new(),
            notifications: Vec::new(),
            deferred_error: None,
        }
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn policy(&self) -> PromotionPolicy {
        self.policy
    }

    pub fn resource(&self) -> &Resource {
        self.ledger.resource()
    }

    pub fn resource_id(&self) -> &str {
        &self.ledger.resource().id
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut CapacityLedger {
        &mut self.ledger
    }

    pub fn waitlist(&self) -> &OrderedWaitlist {
        &self.waitlist
    }

    pub fn waitlist_mut(&mut self) -> &mut OrderedWaitlist {
        &mut self.waitlist
    }

    /// Current active entry of a party, including writes made in this section
    pub fn active_entry(&self, party_id: &str) -> ManagerResult<Option<RegistrationEntry>> {
        if let Some(entry) = self
            .touched
            .values()
            .find(|e| e.party_id == party_id && e.is_active())
        {
            return Ok(Some(entry.clone()));
        }
        if let Some(entry) = self.waitlist.find_party(party_id) {
            return Ok(Some(entry.clone()));
        }
        match self.store.get_entry(self.resource_id(), party_id)? {
            // superseded in this section
            Some(stored) if self.touched.contains_key(&stored.id) => Ok(None),
            // left the queue in this section without being recorded
            Some(stored) if stored.status == EntryStatus::Waitlisted => Ok(None),
            other => Ok(other),
        }
    }

    /// Entries of this resource in `statuses` (all when empty), as they
    /// stand in this section, ordered by registration time
    pub fn entries(&self, statuses: &[EntryStatus]) -> ManagerResult<Vec<RegistrationEntry>> {
        let stored = self
            .store
            .query_entries(self.resource_id(), statuses, EntryOrder::RegisteredAt)?;

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(stored.len());
        for entry in stored {
            seen.insert(entry.id.clone());
            out.push(self.current(entry));
        }
        for entry in self.touched.values().chain(self.waitlist.iter()) {
            if seen.insert(entry.id.clone()) {
                out.push(entry.clone());
            }
        }

        out.retain(|e| statuses.is_empty() || statuses.contains(&e.status));
        out.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(out)
    }

    fn current(&self, stored: RegistrationEntry) -> RegistrationEntry {
        if let Some(entry) = self.touched.get(&stored.id) {
            return entry.clone();
        }
        if let Some(entry) = self.waitlist.get(&stored.id) {
            return entry.clone();
        }
        stored
    }

    /// Stage an entry write (last write per entry wins)
    pub fn record(&mut self, entry: RegistrationEntry) {
        self.touched.insert(entry.id.clone(), entry);
    }

    pub fn emit(&mut self, payload: EventPayload) {
        self.events.push(payload);
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Commit the staged writes, then report `err` to the caller
    pub fn fail_after_commit(&mut self, err: ManagerError) {
        self.deferred_error = Some(err);
    }

    /// Promote after `trigger` freed a slot, if that trigger applies to
    /// this resource kind
    pub fn refill_after(&mut self, trigger: VacancyTrigger) -> Vec<RegistrationEntry> {
        if !accepts_trigger(self.resource().kind, trigger) {
            return Vec::new();
        }
        self.promote_vacancies()
    }

    /// Fill free slots from the head of the waitlist.
    ///
    /// Repeats while a slot is free and someone is queued. Does nothing on a
    /// resource that no longer accepts registrations.
    pub fn promote_vacancies(&mut self) -> Vec<RegistrationEntry> {
        let mut promoted = Vec::new();
        if !self.resource().status.is_bookable() {
            return promoted;
        }

        while self.ledger.has_vacancy() {
            let Some(head) = self.waitlist.peek_head() else {
                break;
            };
            let head_id = head.id.clone();
            let from_position = head.position.unwrap_or(1);
            let shifted = self.waitlist.count_behind(from_position);
            let Some(mut entry) = self.waitlist.remove_entry(&head_id) else {
                break;
            };

            entry.promoted_at = Some(self.now);
            entry.promotion_notified = true;
            self.ledger.increment(1);

            match self.policy {
                PromotionPolicy::Immediate => {
                    entry.status = EntryStatus::Confirmed;
                    self.emit(EventPayload::EntryPromoted {
                        entry_id: entry.id.clone(),
                        party_id: entry.party_id.clone(),
                        from_position,
                    });
                    let n = Notification::promoted(&entry, self.resource());
                    self.notify(n);
                }
                PromotionPolicy::ClaimWindow { window_ms } => {
                    let expires_at = self.now + window_ms;
                    entry.status = EntryStatus::Offered;
                    entry.offer_expires_at = Some(expires_at);
                    self.emit(EventPayload::OfferExtended {
                        entry_id: entry.id.clone(),
                        party_id: entry.party_id.clone(),
                        from_position,
                        expires_at,
                    });
                    let n = Notification::offered(&entry, self.resource(), expires_at);
                    self.notify(n);
                }
            }
            if shifted > 0 {
                self.emit(EventPayload::WaitlistCompacted {
                    from_position,
                    shifted,
                });
            }

            tracing::info!(
                resource_id = %entry.resource_id,
                party_id = %entry.party_id,
                status = %entry.status,
                from_position,
                "Promoted from waitlist"
            );
            self.record(entry.clone());
            promoted.push(entry);
        }
        promoted
    }

    /// Expire every offer whose claim deadline has passed, then refill.
    ///
    /// Returns how many offers expired.
    pub fn expire_due_offers(&mut self) -> ManagerResult<u32> {
        let due: Vec<_> = self
            .entries(&[EntryStatus::Offered])?
            .into_iter()
            .filter(|e| e.offer_expires_at.is_some_and(|t| t < self.now))
            .collect();

        for entry in &due {
            self.expire_offer(entry.clone());
        }
        if !due.is_empty() {
            self.refill_after(VacancyTrigger::OfferExpiry);
        }
        Ok(due.len() as u32)
    }

    /// Release the slot held by an unclaimed offer
    pub fn expire_offer(&mut self, mut entry: RegistrationEntry) {
        entry.status = EntryStatus::Expired;
        entry.ended_at = Some(self.now);
        self.ledger.increment(-1);
        self.emit(EventPayload::OfferExpired {
            entry_id: entry.id.clone(),
            party_id: entry.party_id.clone(),
        });
        let n = Notification::offer_expired(&entry, self.resource());
        self.notify(n);
        tracing::info!(
            resource_id = %entry.resource_id,
            party_id = %entry.party_id,
            "Offer expired"
        );
        self.record(entry);
    }

    /// Turn the section into one write batch plus what to publish after it
    pub fn finish(mut self) -> SectionOutcome {
        let mut entries = self.waitlist.take_touched();
        entries.retain(|e| !self.touched.contains_key(&e.id));
        entries.extend(self.touched.into_values());

        let resource = self.ledger.finish(self.now);
        SectionOutcome {
            batch: WriteBatch {
                resource,
                entries,
                processed: None,
            },
            events: self.events,
            notifications: self.notifications,
            error: self.deferred_error,
            timestamp: self.now,
        }
    }
}

/// One operation executed inside a resource's exclusive section
pub trait RegistrationHandler {
    /// Returns the entry the operation acted on, if any
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>>;
}
