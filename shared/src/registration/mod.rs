//! Registration Module
//!
//! Types for the capacity-bounded registration engine:
//! - Resources: bookable units (class sessions, equipment items)
//! - Entries: one party's claim on a resource (confirmed, waitlisted, ...)
//! - Commands: requests from clients to change registrations
//! - Events: facts broadcast after a command is committed

pub mod command;
pub mod event;
pub mod types;

// Re-exports
pub use command::{
    CommandError, CommandErrorCode, CommandResponse, RegistrationCommand,
    RegistrationCommandPayload,
};
pub use event::{EventPayload, RegistrationEvent};
pub use types::*;
