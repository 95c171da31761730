//! Promotion policy and vacancy triggers per resource kind

use shared::registration::ResourceKind;

/// Default claim window for equipment offers (5 minutes)
pub const DEFAULT_CLAIM_WINDOW_MS: i64 = 5 * 60 * 1000;

/// What happens to the head of the waitlist when a slot frees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionPolicy {
    /// Head is confirmed on the spot (classes)
    Immediate,
    /// Head is offered the slot and must claim it before the deadline
    /// (equipment); the slot is held meanwhile
    ClaimWindow { window_ms: i64 },
}

/// Event that frees a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacancyTrigger {
    Cancellation,
    SessionEnd,
    OfferExpiry,
}

/// Tunables for the registration engine
#[derive(Debug, Clone, Copy)]
pub struct RegistrationSettings {
    pub claim_window_ms: i64,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            claim_window_ms: DEFAULT_CLAIM_WINDOW_MS,
        }
    }
}

impl RegistrationSettings {
    pub fn policy_for(&self, kind: ResourceKind) -> PromotionPolicy {
        match kind {
            ResourceKind::Class => PromotionPolicy::Immediate,
            ResourceKind::Equipment => PromotionPolicy::ClaimWindow {
                window_ms: self.claim_window_ms,
            },
        }
    }
}

/// Whether `trigger` frees a slot on a resource of `kind`
pub fn accepts_trigger(kind: ResourceKind, trigger: VacancyTrigger) -> bool {
    match trigger {
        VacancyTrigger::Cancellation => true,
        VacancyTrigger::SessionEnd | VacancyTrigger::OfferExpiry => {
            kind == ResourceKind::Equipment
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_per_kind() {
        let settings = RegistrationSettings::default();
        assert_eq!(settings.policy_for(ResourceKind::Class), PromotionPolicy::Immediate);
        assert_eq!(
            settings.policy_for(ResourceKind::Equipment),
            PromotionPolicy::ClaimWindow {
                window_ms: 300_000
            }
        );
    }

    #[test]
    fn session_end_only_frees_equipment() {
        assert!(accepts_trigger(ResourceKind::Class, VacancyTrigger::Cancellation));
        assert!(!accepts_trigger(ResourceKind::Class, VacancyTrigger::SessionEnd));
        assert!(accepts_trigger(ResourceKind::Equipment, VacancyTrigger::SessionEnd));
    }

    #[test]
    fn cancellation_frees_every_kind_expiry_only_equipment() {
        assert!(accepts_trigger(ResourceKind::Equipment, VacancyTrigger::Cancellation));
        assert!(accepts_trigger(ResourceKind::Equipment, VacancyTrigger::OfferExpiry));
        assert!(!accepts_trigger(ResourceKind::Class, VacancyTrigger::OfferExpiry));
    }
}
