//! Registration commands - requests from clients to change registrations

use super::types::RegistrationEntry;
use serde::{Deserialize, Serialize};

/// Registration command envelope
///
/// `command_id` is the idempotency key: replaying a committed command
/// returns the stored response without re-executing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCommand {
    /// Command unique ID (idempotency key)
    pub command_id: String,
    /// Operator who issued the command (member app user or front desk)
    pub operator_id: String,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Command payload
    pub payload: RegistrationCommandPayload,
}

impl RegistrationCommand {
    pub fn new(operator_id: impl Into<String>, payload: RegistrationCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            operator_id: operator_id.into(),
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    /// Resource this command targets
    pub fn resource_id(&self) -> &str {
        self.payload.resource_id()
    }
}

/// Command payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationCommandPayload {
    /// Register a party (confirmed or waitlisted)
    Register {
        resource_id: String,
        party_id: String,
        party_name: String,
    },
    /// Cancel the party's active entry
    Cancel {
        resource_id: String,
        party_id: String,
    },
    /// Claim a held slot offer (equipment)
    ClaimOffer {
        resource_id: String,
        party_id: String,
    },
    /// End an equipment session, freeing the slot
    EndSession {
        resource_id: String,
        party_id: String,
    },
    /// Fill free slots from the waitlist
    Promote { resource_id: String },
    /// Cancel a class and every registration on it
    CancelResource { resource_id: String },
    /// Mark a resource completed
    CompleteResource { resource_id: String },
}

impl RegistrationCommandPayload {
    pub fn resource_id(&self) -> &str {
        match self {
            RegistrationCommandPayload::Register { resource_id, .. }
            | RegistrationCommandPayload::Cancel { resource_id, .. }
            | RegistrationCommandPayload::ClaimOffer { resource_id, .. }
            | RegistrationCommandPayload::EndSession { resource_id, .. }
            | RegistrationCommandPayload::Promote { resource_id }
            | RegistrationCommandPayload::CancelResource { resource_id }
            | RegistrationCommandPayload::CompleteResource { resource_id } => resource_id,
        }
    }
}

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Entry affected by the command (register, cancel, claim, end session)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<RegistrationEntry>,
    /// Whether this response is a replay of an already committed command
    #[serde(default)]
    pub duplicate: bool,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, entry: Option<RegistrationEntry>) -> Self {
        Self {
            command_id,
            success: true,
            entry,
            duplicate: false,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            entry: None,
            duplicate: false,
            error: Some(error),
        }
    }

    /// Mark a stored response as a replay
    pub fn into_duplicate(mut self) -> Self {
        self.duplicate = true;
        self
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    ResourceNotFound,
    ResourceNotBookable,
    AlreadyRegistered,
    NotRegistered,
    ResourceFull,
    OfferExpired,
    InvalidOperation,
    InternalError,
    // Storage errors (transient, caller may retry the whole command)
    StoreUnavailable,
    StorageFull,
    StorageCorrupted,
}

impl CommandErrorCode {
    /// Whether retrying the same command may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CommandErrorCode::StoreUnavailable | CommandErrorCode::StorageFull
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_tagging() {
        let cmd = RegistrationCommand::new(
            "desk-1",
            RegistrationCommandPayload::Register {
                resource_id: "class-1".to_string(),
                party_id: "p1".to_string(),
                party_name: "Alice".to_string(),
            },
        );
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["payload"]["type"], "REGISTER");
        assert_eq!(cmd.resource_id(), "class-1");

        let back: RegistrationCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back.command_id, cmd.command_id);
    }

    #[test]
    fn test_error_response_shape() {
        let resp = CommandResponse::error(
            "cmd-1".to_string(),
            CommandError::new(CommandErrorCode::ResourceFull, "full"),
        );
        assert!(!resp.success);
        assert!(!resp.duplicate);
        assert_eq!(resp.error.unwrap().code, CommandErrorCode::ResourceFull);
        assert!(CommandErrorCode::StoreUnavailable.is_transient());
        assert!(!CommandErrorCode::AlreadyRegistered.is_transient());
    }
}
