//! Registration action implementations
//!
//! Each action implements [`RegistrationHandler`] and handles one
//! operation inside the target resource's exclusive section.

use crate::registration::manager::ManagerResult;
use crate::registration::traits::{CommandMetadata, RegistrationHandler, SectionContext};
use shared::registration::{RegistrationCommandPayload, RegistrationEntry};

mod cancel;
mod cancel_resource;
mod claim_offer;
mod complete_resource;
mod end_session;
mod promote;
mod register;
mod upsert_resource;

pub use cancel::CancelAction;
pub use cancel_resource::CancelResourceAction;
pub use claim_offer::ClaimOfferAction;
pub use complete_resource::CompleteResourceAction;
pub use end_session::EndSessionAction;
pub use promote::PromoteAction;
pub use register::RegisterAction;
pub use upsert_resource::UpsertResourceAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    Register(RegisterAction),
    Cancel(CancelAction),
    ClaimOffer(ClaimOfferAction),
    EndSession(EndSessionAction),
    Promote(PromoteAction),
    CancelResource(CancelResourceAction),
    CompleteResource(CompleteResourceAction),
}

impl RegistrationHandler for CommandAction {
    fn execute(
        &self,
        ctx: &mut SectionContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Option<RegistrationEntry>> {
        match self {
            CommandAction::Register(action) => action.execute(ctx, metadata),
            CommandAction::Cancel(action) => action.execute(ctx, metadata),
            CommandAction::ClaimOffer(action) => action.execute(ctx, metadata),
            CommandAction::EndSession(action) => action.execute(ctx, metadata),
            CommandAction::Promote(action) => action.execute(ctx, metadata),
            CommandAction::CancelResource(action) => action.execute(ctx, metadata),
            CommandAction::CompleteResource(action) => action.execute(ctx, metadata),
        }
    }
}

/// Convert a command payload to its action
///
/// This is the ONLY place with a match on RegistrationCommandPayload.
impl From<&RegistrationCommandPayload> for CommandAction {
    fn from(payload: &RegistrationCommandPayload) -> Self {
        match payload {
            RegistrationCommandPayload::Register {
                party_id,
                party_name,
                ..
            } => CommandAction::Register(RegisterAction {
                party_id: party_id.clone(),
                party_name: party_name.clone(),
            }),
            RegistrationCommandPayload::Cancel { party_id, .. } => {
                CommandAction::Cancel(CancelAction {
                    party_id: party_id.clone(),
                })
            }
            RegistrationCommandPayload::ClaimOffer { party_id, .. } => {
                CommandAction::ClaimOffer(ClaimOfferAction {
                    party_id: party_id.clone(),
                })
            }
            RegistrationCommandPayload::EndSession { party_id, .. } => {
                CommandAction::EndSession(EndSessionAction {
                    party_id: party_id.clone(),
                })
            }
            RegistrationCommandPayload::Promote { .. } => CommandAction::Promote(PromoteAction),
            RegistrationCommandPayload::CancelResource { .. } => {
                CommandAction::CancelResource(CancelResourceAction)
            }
            RegistrationCommandPayload::CompleteResource { .. } => {
                CommandAction::CompleteResource(CompleteResourceAction)
            }
        }
    }
}
