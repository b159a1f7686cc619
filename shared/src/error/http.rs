//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::OrderItemNotFound
            | Self::ProductNotFound
            | Self::TableNotFound
            | Self::QrTokenInvalid
            | Self::WaiterCallNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (state machine and optimistic version violations)
            Self::AlreadyExists
            | Self::VersionConflict
            | Self::OrderNotOpen
            | Self::InvalidItemTransition
            | Self::ItemNotRemovable
            | Self::UnresolvedItems
            | Self::ProductUnavailable
            | Self::TableNotFree
            | Self::TableNotOccupied
            | Self::TableNumberExists
            | Self::InvalidCallTransition => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::PermissionDenied | Self::RoleRequired | Self::CpfMismatch => {
                StatusCode::FORBIDDEN
            }

            // 503 Service Unavailable (transient, client can retry)
            Self::ResourceBusy => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::InvalidPaymentMethod => StatusCode::BAD_REQUEST,
        }
    }
}
