//! EndSession command handler
//!
//! Ends a confirmed equipment session and hands the slot to the waitlist.

use crate::registration::manager::{ManagerError, ManagerResult};
use crate::registration::policy::{VacancyTrigger, accepts_trigger};
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::{EntryStatus, EventPayload, RegistrationEntry};

/// EndSession action
#[derive(Debug, Clone)]
pub struct EndSessionAction {
    pub party_id: String,
}

impl RegistrationHandler for EndSessionAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        let resource_id = ctx.resource_id().to_string();
        if !accepts_trigger(ctx.resource().kind, VacancyTrigger::SessionEnd) {
            return Err(ManagerError::InvalidOperation(format!(
                "{} is not equipment; sessions cannot be ended",
                resource_id
            )));
        }

        let mut entry =
            ctx.active_entry(&self.party_id)?
                .ok_or_else(|| ManagerError::NotRegistered {
                    resource_id: resource_id.clone(),
                    party_id: self.party_id.clone(),
                })?;
        if entry.status != EntryStatus::Confirmed {
            return Err(ManagerError::InvalidOperation(format!(
                "No running session for {} on {} (entry is {})",
                self.party_id, resource_id, entry.status
            )));
        }

        entry.status = EntryStatus::Completed;
        entry.ended_at = Some(ctx.now());
        ctx.ledger_mut().increment(-1);
        ctx.record(entry.clone());
        ctx.emit(EventPayload::SessionEnded {
            entry_id: entry.id.clone(),
            party_id: entry.party_id.clone(),
        });
        tracing::info!(
            resource_id = %resource_id,
            party_id = %self.party_id,
            operator_id = %metadata.operator_id,
            "Equipment session ended"
        );

        ctx.refill_after(VacancyTrigger::SessionEnd);
        Ok(Some(entry))
    }
}
