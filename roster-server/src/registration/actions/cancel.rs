//! Cancel command handler
//!
//! Cancels the party's active entry. A freed slot is refilled from the
//! waitlist; a waitlisted cancellation closes the gap in the queue.

use crate::registration::manager::{ManagerError, ManagerResult};
use crate::registration::policy::VacancyTrigger;
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::{EntryStatus, EventPayload, RegistrationEntry};

/// Cancel action
#[derive(Debug, Clone)]
pub struct CancelAction {
    pub party_id: String,
}

impl RegistrationHandler for CancelAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        let resource_id = ctx.resource_id().to_string();
        let not_registered = || ManagerError::NotRegistered {
            resource_id: resource_id.clone(),
            party_id: self.party_id.clone(),
        };
        let entry = ctx.active_entry(&self.party_id)?.ok_or_else(not_registered)?;
        let previous_status = entry.status;

        let mut entry = match previous_status {
            EntryStatus::Waitlisted => {
                let from_position = entry.position;
                let shifted = from_position.map_or(0, |p| ctx.waitlist().count_behind(p));
                let removed = ctx.waitlist_mut().remove_entry(&entry.id).unwrap_or(entry);
                if let Some(from_position) = from_position
                    && shifted > 0
                {
                    ctx.emit(EventPayload::WaitlistCompacted {
                        from_position,
                        shifted,
                    });
                }
                removed
            }
            EntryStatus::Confirmed | EntryStatus::Offered => {
                ctx.ledger_mut().increment(-1);
                entry
            }
            _ => return Err(not_registered()),
        };

        entry.status = EntryStatus::Canceled;
        entry.canceled_at = Some(ctx.now());
        entry.position = None;
        entry.offer_expires_at = None;
        ctx.record(entry.clone());
        ctx.emit(EventPayload::EntryCanceled {
            entry_id: entry.id.clone(),
            party_id: entry.party_id.clone(),
            previous_status,
        });
        tracing::info!(
            resource_id = %entry.resource_id,
            party_id = %entry.party_id,
            operator_id = %metadata.operator_id,
            previous_status = %previous_status,
            "Registration canceled"
        );

        if previous_status.holds_slot() {
            ctx.refill_after(VacancyTrigger::Cancellation);
        }
        Ok(Some(entry))
    }
}
