//! Error codes shared by the edge server and every client
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product errors
//! - 7xxx: Table errors
//! - 8xxx: Waiter call errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 on the wire so the TypeScript clients can switch on it.
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
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Record changed underneath the caller (stale version)
    VersionConflict = 9,
    /// Resource is locked by another action
    ResourceBusy = 10,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Customer CPF does not match the order
    CpfMismatch = 2006,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is not open
    OrderNotOpen = 4002,
    /// Order item not found
    OrderItemNotFound = 4003,
    /// Requested item status change is not allowed from the current status
    InvalidItemTransition = 4004,
    /// Item can only be removed while pending
    ItemNotRemovable = 4005,
    /// Order still has pending or preparing items
    UnresolvedItems = 4006,

    // ==================== 5xxx: Payment ====================
    /// Payment method missing or unknown
    InvalidPaymentMethod = 5001,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product is not available for ordering
    ProductUnavailable = 6002,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is not free
    TableNotFree = 7002,
    /// Table is free (no visit in progress)
    TableNotOccupied = 7003,
    /// QR token does not identify any table
    QrTokenInvalid = 7004,
    /// Table number already used
    TableNumberExists = 7005,

    // ==================== 8xxx: Waiter call ====================
    /// Waiter call not found
    WaiterCallNotFound = 8001,
    /// Requested call status change is not allowed
    InvalidCallTransition = 8002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
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

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::VersionConflict => "Record was modified by another action",
            ErrorCode::ResourceBusy => "Resource is busy, try again",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::CpfMismatch => "CPF does not match this order",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderNotOpen => "Order is not open",
            ErrorCode::OrderItemNotFound => "Order item not found",
            ErrorCode::InvalidItemTransition => "Item status change not allowed",
            ErrorCode::ItemNotRemovable => "Only pending items can be removed",
            ErrorCode::UnresolvedItems => "Order has items still pending or preparing",

            // Payment
            ErrorCode::InvalidPaymentMethod => "Payment method is missing or invalid",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductUnavailable => "Product is not available",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableNotFree => "Table is not free",
            ErrorCode::TableNotOccupied => "Table is not occupied",
            ErrorCode::QrTokenInvalid => "QR code is invalid or expired",
            ErrorCode::TableNumberExists => "Table number already exists",

            // Waiter call
            ErrorCode::WaiterCallNotFound => "Waiter call not found",
            ErrorCode::InvalidCallTransition => "Waiter call status change not allowed",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
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
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::VersionConflict),
            10 => Ok(ErrorCode::ResourceBusy),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2006 => Ok(ErrorCode::CpfMismatch),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderNotOpen),
            4003 => Ok(ErrorCode::OrderItemNotFound),
            4004 => Ok(ErrorCode::InvalidItemTransition),
            4005 => Ok(ErrorCode::ItemNotRemovable),
            4006 => Ok(ErrorCode::UnresolvedItems),

            // Payment
            5001 => Ok(ErrorCode::InvalidPaymentMethod),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductUnavailable),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableNotFree),
            7003 => Ok(ErrorCode::TableNotOccupied),
            7004 => Ok(ErrorCode::QrTokenInvalid),
            7005 => Ok(ErrorCode::TableNumberExists),

            // Waiter call
            8001 => Ok(ErrorCode::WaiterCallNotFound),
            8002 => Ok(ErrorCode::InvalidCallTransition),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
