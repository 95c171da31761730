//! Register command handler
//!
//! Confirms the party when a slot is free, otherwise queues it at the tail
//! of the waitlist.

use crate::registration::manager::{ManagerError, ManagerResult};
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::{EntryStatus, EventPayload, RegistrationEntry};

/// Register action
#[derive(Debug, Clone)]
pub struct RegisterAction {
    pub party_id: String,
    pub party_name: String,
}

impl RegistrationHandler for RegisterAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        let resource_id = ctx.resource_id().to_string();

        // 1. One active entry per party and resource
        if ctx.active_entry(&self.party_id)?.is_some() {
            return Err(ManagerError::AlreadyRegistered {
                resource_id,
                party_id: self.party_id.clone(),
            });
        }

        // 2. Resource must accept registrations
        if !ctx.resource().status.is_bookable() {
            return Err(ManagerError::ResourceNotBookable(resource_id));
        }

        // 3. Queued parties go before a newcomer takes a free slot
        if ctx.ledger().has_vacancy() && !ctx.waitlist().is_empty() {
            ctx.promote_vacancies();
        }

        let mut entry =
            RegistrationEntry::new(&resource_id, &self.party_id, &self.party_name, ctx.now());

        // 4a. Free slot: confirm
        if ctx.ledger().has_vacancy() {
            entry.status = EntryStatus::Confirmed;
            let occupied = ctx.ledger_mut().increment(1);
            ctx.emit(EventPayload::EntryConfirmed {
                entry_id: entry.id.clone(),
                party_id: entry.party_id.clone(),
            });
            tracing::info!(
                resource_id = %resource_id,
                party_id = %self.party_id,
                operator_id = %metadata.operator_id,
                occupied,
                "Registration confirmed"
            );
            ctx.record(entry.clone());
            return Ok(Some(entry));
        }

        // 4b. Full: queue, unless the waitlist is off or at its cap
        let resource = ctx.resource();
        let waitlist_full = resource
            .waitlist_capacity
            .is_some_and(|cap| ctx.waitlist().len() as u32 >= cap);
        if !resource.waitlist_enabled || waitlist_full {
            return Err(ManagerError::ResourceFull(resource_id));
        }

        let entry_id = entry.id.clone();
        let position = ctx.waitlist_mut().append(entry);
        let entry = ctx
            .waitlist()
            .get(&entry_id)
            .cloned()
            .ok_or_else(|| ManagerError::InvalidOperation("waitlist append lost entry".into()))?;

        ctx.emit(EventPayload::EntryWaitlisted {
            entry_id,
            party_id: self.party_id.clone(),
            position,
        });
        tracing::info!(
            resource_id = %resource_id,
            party_id = %self.party_id,
            operator_id = %metadata.operator_id,
            position,
            "Registration waitlisted"
        );
        Ok(Some(entry))
    }
}
