//! Shared types for the Roster registration engine
//!
//! Common types used by the server and its clients: registration
//! resources and entries, commands, events, the unified error system
//! and small utilities.

pub mod error;
pub mod registration;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use registration::{
    CommandError, CommandErrorCode, CommandResponse, EntryStatus, EventPayload,
    RegistrationCommand, RegistrationCommandPayload, RegistrationEntry, RegistrationEvent,
    Resource, ResourceInput, ResourceKind, ResourceStatus,
};
