//! Unified error codes for the Roster engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Registration errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Registration ====================
    /// Bookable resource does not exist
    ResourceNotFound = 4001,
    /// Resource is canceled or completed
    ResourceNotBookable = 4002,
    /// Party already holds an active entry
    AlreadyRegistered = 4003,
    /// Party holds no active entry
    NotRegistered = 4004,
    /// No capacity left and waitlist disabled or full
    ResourceFull = 4005,
    /// Slot offer was not claimed in time
    OfferExpired = 4006,
    /// Operation not allowed in the current state
    InvalidOperation = 4007,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,

    // ==================== 94xx: Storage ====================
    /// Store unavailable (transient, retry the whole operation)
    StoreUnavailable = 9400,
    /// Storage full (disk space insufficient)
    StorageFull = 9401,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Registration
            ErrorCode::ResourceNotFound => "Bookable resource not found",
            ErrorCode::ResourceNotBookable => "Resource is not open for registration",
            ErrorCode::AlreadyRegistered => "Already registered for this resource",
            ErrorCode::NotRegistered => "No active registration for this resource",
            ErrorCode::ResourceFull => "Resource is full",
            ErrorCode::OfferExpired => "Slot offer has expired",
            ErrorCode::InvalidOperation => "Invalid operation",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StoreUnavailable => "Store unavailable, please retry later",
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Registration
            4001 => Ok(ErrorCode::ResourceNotFound),
            4002 => Ok(ErrorCode::ResourceNotBookable),
            4003 => Ok(ErrorCode::AlreadyRegistered),
            4004 => Ok(ErrorCode::NotRegistered),
            4005 => Ok(ErrorCode::ResourceFull),
            4006 => Ok(ErrorCode::OfferExpired),
            4007 => Ok(ErrorCode::InvalidOperation),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            // Storage
            9400 => Ok(ErrorCode::StoreUnavailable),
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl From<crate::registration::CommandErrorCode> for ErrorCode {
    fn from(code: crate::registration::CommandErrorCode) -> Self {
        use crate::registration::CommandErrorCode as C;
        match code {
            C::ResourceNotFound => ErrorCode::ResourceNotFound,
            C::ResourceNotBookable => ErrorCode::ResourceNotBookable,
            C::AlreadyRegistered => ErrorCode::AlreadyRegistered,
            C::NotRegistered => ErrorCode::NotRegistered,
            C::ResourceFull => ErrorCode::ResourceFull,
            C::OfferExpired => ErrorCode::OfferExpired,
            C::InvalidOperation => ErrorCode::InvalidOperation,
            C::InternalError => ErrorCode::InternalError,
            C::StoreUnavailable => ErrorCode::StoreUnavailable,
            C::StorageFull => ErrorCode::StorageFull,
            C::StorageCorrupted => ErrorCode::StorageCorrupted,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
