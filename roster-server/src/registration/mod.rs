//! Registration engine
//!
//! Capacity-bounded registration with an ordered waitlist for class
//! sessions and gym equipment.
//!
//! # Architecture
//!
//! ```text
//! RegistrationManager
//!     ├─ ResourceLocks      one mutex per resource
//!     ├─ SectionContext     CapacityLedger + OrderedWaitlist for one section
//!     ├─ actions/           one handler per operation
//!     ├─ RegistrationStore  redb, one atomic WriteBatch per operation
//!     ├─ broadcast          RegistrationEvent after commit → EventJournal
//!     └─ NotificationWorker best-effort delivery after commit
//! ```
//!
//! Classes promote the waitlist head immediately. Equipment offers the
//! freed slot to the head, who must claim it within the claim window.

pub mod actions;
pub mod clock;
pub mod ledger;
pub mod listener;
pub mod locks;
pub mod manager;
pub mod notifier;
pub mod policy;
pub mod reconcile;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod traits;
pub mod waitlist;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::CapacityLedger;
pub use listener::EventJournal;
pub use manager::{ManagerError, ManagerResult, RegistrationManager};
pub use notifier::{
    LogNotifier, Notification, NotificationSender, NotificationWorker, Notifier, NotifyError,
    WebhookNotifier,
};
pub use policy::{PromotionPolicy, RegistrationSettings};
pub use reconcile::ReconcileReport;
pub use scheduler::{OfferSweeper, ReconcileScheduler};
pub use storage::{RedbStore, StorageError, StorageResult};
pub use store::{EntryOrder, RegistrationStore, WriteBatch};
pub use waitlist::OrderedWaitlist;
