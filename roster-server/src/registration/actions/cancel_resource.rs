//! CancelResource command handler
//!
//! Cancels a class session together with every active registration on it.

use crate::registration::manager::{ManagerError, ManagerResult};
use crate::registration::notifier::Notification;
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::{
    EntryStatus, EventPayload, RegistrationEntry, ResourceKind, ResourceStatus,
};

/// CancelResource action
#[derive(Debug, Clone, Default)]
pub struct CancelResourceAction;

impl RegistrationHandler for CancelResourceAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        let resource_id = ctx.resource_id().to_string();

        // 1. Classes only
        if ctx.resource().kind == ResourceKind::Equipment {
            return Err(ManagerError::InvalidOperation(format!(
                "Equipment {} cannot be canceled; complete it to retire",
                resource_id
            )));
        }

        // 2. Must still be open
        if !ctx.resource().status.is_bookable() {
            return Err(ManagerError::ResourceNotBookable(resource_id));
        }

        // 3. Release every active entry
        let affected = ctx.entries(EntryStatus::ACTIVE)?;
        ctx.waitlist_mut().drain();
        ctx.ledger_mut().set_status(ResourceStatus::Canceled);

        let now = ctx.now();
        for mut entry in affected.iter().cloned() {
            entry.status = EntryStatus::Canceled;
            entry.canceled_at = Some(now);
            entry.position = None;
            entry.offer_expires_at = None;
            entry.cancellation_notified = true;
            let n = Notification::resource_canceled(&entry, ctx.resource());
            ctx.notify(n);
            ctx.record(entry);
        }

        // 4. Nothing holds a slot on a retired resource
        ctx.ledger_mut().recount(0);
        ctx.emit(EventPayload::ResourceCanceled {
            affected: affected.len() as u32,
        });
        tracing::info!(
            resource_id = %resource_id,
            operator_id = %metadata.operator_id,
            affected = affected.len(),
            "Resource canceled"
        );
        Ok(None)
    }
}
