//! Promote command handler

use crate::registration::manager::ManagerResult;
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::RegistrationEntry;

/// Fill free slots from the waitlist; returns the first promoted entry
#[derive(Debug, Clone, Default)]
pub struct PromoteAction;

impl RegistrationHandler for PromoteAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        _metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        Ok(ctx.promote_vacancies().into_iter().next())
    }
}
