//! CompleteResource command handler
//!
//! Marks a class as held (or retires equipment). Entries stay as history.

use crate::registration::manager::{ManagerError, ManagerResult};
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::{EventPayload, RegistrationEntry, ResourceStatus};

/// CompleteResource action
#[derive(Debug, Clone, Default)]
pub struct CompleteResourceAction;

impl RegistrationHandler for CompleteResourceAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        match ctx.resource().status {
            ResourceStatus::Completed => return Ok(None),
            ResourceStatus::Canceled => {
                return Err(ManagerError::InvalidOperation(format!(
                    "Resource {} is canceled and cannot be completed",
                    ctx.resource_id()
                )));
            }
            ResourceStatus::Scheduled | ResourceStatus::Active => {}
        }

        ctx.ledger_mut().set_status(ResourceStatus::Completed);
        ctx.emit(EventPayload::ResourceCompleted);
        tracing::info!(
            resource_id = %ctx.resource_id(),
            operator_id = %metadata.operator_id,
            "Resource completed"
        );
        Ok(None)
    }
}
