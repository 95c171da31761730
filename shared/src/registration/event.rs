//! Registration events - facts broadcast after a state change is committed

use super::types::EntryStatus;
use serde::{Deserialize, Serialize};

/// Registration event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationEvent {
    /// Event unique ID
    pub event_id: String,
    /// Resource this event belongs to
    pub resource_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Command that triggered this event, if any (sweeps and reconciliation have none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    /// Event payload
    pub payload: EventPayload,
}

impl RegistrationEvent {
    pub fn new(
        resource_id: impl Into<String>,
        timestamp: i64,
        command_id: Option<String>,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            resource_id: resource_id.into(),
            timestamp,
            command_id,
            payload,
        }
    }
}

/// Event payloads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    /// Party took a free slot directly
    EntryConfirmed { entry_id: String, party_id: String },
    /// Party joined the waitlist
    EntryWaitlisted {
        entry_id: String,
        party_id: String,
        position: u32,
    },
    /// Head of the waitlist was confirmed
    EntryPromoted {
        entry_id: String,
        party_id: String,
        from_position: u32,
    },
    /// Head of the waitlist was offered a held slot
    OfferExtended {
        entry_id: String,
        party_id: String,
        from_position: u32,
        expires_at: i64,
    },
    OfferClaimed { entry_id: String, party_id: String },
    OfferExpired { entry_id: String, party_id: String },
    EntryCanceled {
        entry_id: String,
        party_id: String,
        previous_status: EntryStatus,
    },
    SessionEnded { entry_id: String, party_id: String },
    /// Positions after `from_position` were shifted down by one
    WaitlistCompacted { from_position: u32, shifted: u32 },
    ResourceUpdated { capacity: u32, occupied: u32 },
    ResourceCanceled { affected: u32 },
    ResourceCompleted,
    /// Reconciliation corrected stored state
    Reconciled {
        occupied_before: u32,
        occupied_after: u32,
        positions_fixed: u32,
    },
}
