//! ClaimOffer command handler
//!
//! Turns a held equipment offer into a confirmed entry. A claim after the
//! deadline expires the offer (committed) and fails with `OfferExpired`.

use crate::registration::manager::{ManagerError, ManagerResult};
use crate::registration::policy::VacancyTrigger;
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::{EntryStatus, EventPayload, RegistrationEntry};

/// ClaimOffer action
#[derive(Debug, Clone)]
pub struct ClaimOfferAction {
    pub party_id: String,
}

impl RegistrationHandler for ClaimOfferAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        let resource_id = ctx.resource_id().to_string();
        let mut entry =
            ctx.active_entry(&self.party_id)?
                .ok_or_else(|| ManagerError::NotRegistered {
                    resource_id: resource_id.clone(),
                    party_id: self.party_id.clone(),
                })?;

        if entry.status != EntryStatus::Offered {
            return Err(ManagerError::InvalidOperation(format!(
                "No pending offer for {} on {} (entry is {})",
                self.party_id, resource_id, entry.status
            )));
        }

        if entry.offer_expires_at.is_some_and(|t| ctx.now() > t) {
            ctx.expire_offer(entry);
            ctx.refill_after(VacancyTrigger::OfferExpiry);
            ctx.fail_after_commit(ManagerError::OfferExpired {
                resource_id,
                party_id: self.party_id.clone(),
            });
            return Ok(None);
        }

        entry.status = EntryStatus::Confirmed;
        entry.offer_expires_at = None;
        ctx.record(entry.clone());
        ctx.emit(EventPayload::OfferClaimed {
            entry_id: entry.id.clone(),
            party_id: entry.party_id.clone(),
        });
        tracing::info!(
            resource_id = %resource_id,
            party_id = %self.party_id,
            operator_id = %metadata.operator_id,
            "Offer claimed"
        );
        Ok(Some(entry))
    }
}
