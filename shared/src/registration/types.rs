//! Shared types for resources and registration entries

use serde::{Deserialize, Serialize};

// ============================================================================
// Resource
// ============================================================================

/// Kind of bookable resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    /// Scheduled fitness class session
    Class,
    /// Piece of gym equipment
    Equipment,
}

impl ResourceKind {
    /// Status a freshly created resource of this kind starts in
    pub fn initial_status(&self) -> ResourceStatus {
        match self {
            ResourceKind::Class => ResourceStatus::Scheduled,
            ResourceKind::Equipment => ResourceStatus::Active,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Class => write!(f, "CLASS"),
            ResourceKind::Equipment => write!(f, "EQUIPMENT"),
        }
    }
}

/// Resource lifecycle status
///
/// Classes move `SCHEDULED → CANCELED | COMPLETED`; equipment is `ACTIVE`
/// until retired.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Scheduled,
    Active,
    Canceled,
    Completed,
}

impl ResourceStatus {
    /// Whether new registrations are accepted
    pub fn is_bookable(&self) -> bool {
        matches!(self, ResourceStatus::Scheduled | ResourceStatus::Active)
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Scheduled => write!(f, "SCHEDULED"),
            ResourceStatus::Active => write!(f, "ACTIVE"),
            ResourceStatus::Canceled => write!(f, "CANCELED"),
            ResourceStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Capacity-bounded bookable unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Resource ID
    pub id: String,
    /// Class session or equipment item
    pub kind: ResourceKind,
    /// Display name
    pub name: String,
    /// Total number of slots
    pub capacity: u32,
    /// Currently occupied slots (confirmed + offered entries)
    #[serde(default)]
    pub occupied: u32,
    /// Whether parties may queue once the resource is full
    pub waitlist_enabled: bool,
    /// Optional cap on the waitlist length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_capacity: Option<u32>,
    /// Lifecycle status
    pub status: ResourceStatus,
    /// Session start (Unix millis, display only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Resource {
    pub fn new(id: impl Into<String>, kind: ResourceKind, name: impl Into<String>, capacity: u32) -> Self {
        let now = crate::util::now_millis();
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            capacity,
            occupied: 0,
            waitlist_enabled: true,
            waitlist_capacity: None,
            status: kind.initial_status(),
            starts_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether at least one slot is free
    pub fn has_vacancy(&self) -> bool {
        self.occupied < self.capacity
    }
}

/// Resource create/update input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInput {
    /// Resource ID (generated when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: ResourceKind,
    pub name: String,
    pub capacity: u32,
    #[serde(default = "default_waitlist_enabled")]
    pub waitlist_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waitlist_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<i64>,
}

fn default_waitlist_enabled() -> bool {
    true
}

// ============================================================================
// Registration Entry
// ============================================================================

/// Registration entry status
///
/// ```text
/// (none) → CONFIRMED → CANCELED | COMPLETED
/// (none) → WAITLISTED → CONFIRMED | OFFERED | CANCELED
/// OFFERED → CONFIRMED | CANCELED | EXPIRED
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Occupies one of the resource's slots
    Confirmed,
    /// Queued for a slot, ordered by position
    Waitlisted,
    /// Promoted from the waitlist, slot held until the claim deadline
    Offered,
    /// Equipment session ended
    Completed,
    Canceled,
    /// Offer not claimed in time
    Expired,
}

impl EntryStatus {
    /// Statuses that count as an active claim on a resource
    pub const ACTIVE: &'static [EntryStatus] = &[
        EntryStatus::Confirmed,
        EntryStatus::Waitlisted,
        EntryStatus::Offered,
    ];

    pub const ALL: &'static [EntryStatus] = &[
        EntryStatus::Confirmed,
        EntryStatus::Waitlisted,
        EntryStatus::Offered,
        EntryStatus::Completed,
        EntryStatus::Canceled,
        EntryStatus::Expired,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Terminal entries are immutable
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Whether the entry holds one of the resource's slots
    pub fn holds_slot(&self) -> bool {
        matches!(self, EntryStatus::Confirmed | EntryStatus::Offered)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryStatus::Confirmed => write!(f, "CONFIRMED"),
            EntryStatus::Waitlisted => write!(f, "WAITLISTED"),
            EntryStatus::Offered => write!(f, "OFFERED"),
            EntryStatus::Completed => write!(f, "COMPLETED"),
            EntryStatus::Canceled => write!(f, "CANCELED"),
            EntryStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// One party's registration against a resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationEntry {
    /// Entry ID
    pub id: String,
    pub resource_id: String,
    pub party_id: String,
    /// Party display name snapshot
    pub party_name: String,
    /// Registration time (Unix millis), secondary tie-break
    pub registered_at: i64,
    pub status: EntryStatus,
    /// Dense 1-based waitlist rank, present only while WAITLISTED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Claim deadline, present only while OFFERED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
    /// "You're in" notification already dispatched
    #[serde(default)]
    pub promotion_notified: bool,
    /// Cancellation notification already dispatched
    #[serde(default)]
    pub cancellation_notified: bool,
}

impl RegistrationEntry {
    pub fn new(
        resource_id: impl Into<String>,
        party_id: impl Into<String>,
        party_name: impl Into<String>,
        registered_at: i64,
    ) -> Self {
        Self {
            id: crate::util::snowflake_string(),
            resource_id: resource_id.into(),
            party_id: party_id.into(),
            party_name: party_name.into(),
            registered_at,
            status: EntryStatus::Confirmed,
            position: None,
            offer_expires_at: None,
            promoted_at: None,
            canceled_at: None,
            ended_at: None,
            promotion_notified: false,
            cancellation_notified: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status_per_kind() {
        let class = Resource::new("c1", ResourceKind::Class, "Spin", 10);
        assert_eq!(class.status, ResourceStatus::Scheduled);
        assert!(class.status.is_bookable());

        let rower = Resource::new("e1", ResourceKind::Equipment, "Rower", 1);
        assert_eq!(rower.status, ResourceStatus::Active);
    }

    #[test]
    fn test_entry_status_classification() {
        assert!(EntryStatus::Offered.is_active());
        assert!(EntryStatus::Offered.holds_slot());
        assert!(!EntryStatus::Waitlisted.holds_slot());
        assert!(EntryStatus::Expired.is_terminal());
        assert!(!ResourceStatus::Completed.is_bookable());
    }

    #[test]
    fn test_resource_input_defaults() {
        let input: ResourceInput = serde_json::from_value(serde_json::json!({
            "kind": "CLASS",
            "name": "Yoga",
            "capacity": 12
        }))
        .unwrap();
        assert!(input.waitlist_enabled);
        assert!(input.id.is_none());
        assert!(input.waitlist_capacity.is_none());
    }

    #[test]
    fn test_entry_serialization_skips_empty_position() {
        let entry = RegistrationEntry::new("c1", "p1", "Alice", 1);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "CONFIRMED");
        assert!(json.get("position").is_none());
    }
}
