//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::ResourceNotFound | Self::NotRegistered => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict
            Self::AlreadyExists
            | Self::ResourceNotBookable
            | Self::AlreadyRegistered
            | Self::ResourceFull
            | Self::OfferExpired => StatusCode::CONFLICT,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::StoreUnavailable | Self::StorageFull => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::StorageCorrupted => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed | Self::InvalidRequest | Self::InvalidOperation => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}
