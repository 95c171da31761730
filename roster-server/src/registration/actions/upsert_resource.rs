//! Resource administration: create or update settings
//!
//! A capacity increase fills the new slots from the waitlist; a decrease
//! never evicts anyone, the resource simply stays over-full until parties
//! leave.

use crate::registration::manager::{ManagerError, ManagerResult};
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::{EventPayload, RegistrationEntry, ResourceInput};

/// UpsertResource action
#[derive(Debug, Clone)]
pub struct UpsertResourceAction {
    pub input: ResourceInput,
}

impl UpsertResourceAction {
    pub fn validate(input: &ResourceInput) -> ManagerResult<()> {
        if input.name.trim().is_empty() {
            return Err(ManagerError::InvalidOperation(
                "Resource name must not be empty".to_string(),
            ));
        }
        if input.capacity == 0 {
            return Err(ManagerError::InvalidOperation(
                "Resource capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl RegistrationHandler for UpsertResourceAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        Self::validate(&self.input)?;

        let resource = ctx.resource();
        if resource.kind != self.input.kind {
            return Err(ManagerError::InvalidOperation(format!(
                "Resource {} is {} and cannot become {}",
                resource.id, resource.kind, self.input.kind
            )));
        }
        if !resource.status.is_bookable() {
            return Err(ManagerError::ResourceNotBookable(resource.id.clone()));
        }

        ctx.ledger_mut().apply_settings(&self.input);
        let promoted = ctx.promote_vacancies();

        let (capacity, occupied) = (ctx.ledger().capacity(), ctx.ledger().occupied());
        ctx.emit(EventPayload::ResourceUpdated { capacity, occupied });
        tracing::info!(
            resource_id = %ctx.resource_id(),
            operator_id = %metadata.operator_id,
            capacity,
            occupied,
            promoted = promoted.len(),
            "Resource saved"
        );
        Ok(None)
    }
}
