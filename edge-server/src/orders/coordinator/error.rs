use crate::orders::locks::LockTimeout;
use crate::orders::machine::{RejectReason, TransitionError};
use crate::store::{EntityKind, StoreError};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Coordinator errors
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("QR token not recognized")]
    UnknownQrToken,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Order {0} is not open")]
    OrderNotOpen(i64),

    #[error("Table {0} has no active order")]
    NoActiveOrder(i64),

    #[error("Table {table_id} has {count} item(s) still pending or preparing")]
    UnresolvedItems { table_id: i64, count: usize },

    #[error("Product {0} is not available")]
    ProductUnavailable(i64),

    #[error("Table number already in use: {0}")]
    TableNumberTaken(String),

    #[error("Waiter call {call_id} cannot move from {from} to {to}")]
    CallTransition {
        call_id: i64,
        from: shared::models::CallStatus,
        to: shared::models::CallStatus,
    },

    #[error("Concurrent modification: {0}")]
    StaleVersion(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Customer credentials do not match order {order_id}")]
    CpfMismatch { order_id: i64 },

    #[error(transparent)]
    Busy(#[from] LockTimeout),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Store(StoreError),
}

/// Coarse classification shared by the HTTP layer and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    Busy,
    Validation,
    Internal,
}

impl CoordinatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::NotFound { .. } | CoordinatorError::UnknownQrToken => {
                ErrorKind::NotFound
            }
            CoordinatorError::Transition(e) => match e.reason {
                RejectReason::InvalidRole => ErrorKind::Forbidden,
                RejectReason::InvalidSourceState | RejectReason::TerminalState => {
                    ErrorKind::Conflict
                }
                RejectReason::InvalidInput(_) => ErrorKind::Validation,
            },
            CoordinatorError::OrderNotOpen(_)
            | CoordinatorError::NoActiveOrder(_)
            | CoordinatorError::UnresolvedItems { .. }
            | CoordinatorError::ProductUnavailable(_)
            | CoordinatorError::TableNumberTaken(_)
            | CoordinatorError::CallTransition { .. }
            | CoordinatorError::StaleVersion(_) => ErrorKind::Conflict,
            CoordinatorError::Forbidden(_) | CoordinatorError::CpfMismatch { .. } => {
                ErrorKind::Forbidden
            }
            CoordinatorError::Busy(_) => ErrorKind::Busy,
            CoordinatorError::Validation(_) => ErrorKind::Validation,
            CoordinatorError::Store(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        CoordinatorError::Validation(msg.into())
    }

    pub(crate) fn forbidden(msg: impl Into<String>) -> Self {
        CoordinatorError::Forbidden(msg.into())
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionMismatch { .. } => CoordinatorError::StaleVersion(err.to_string()),
            StoreError::AlreadyExists { .. } => CoordinatorError::StaleVersion(err.to_string()),
            StoreError::Missing { kind, id } => CoordinatorError::NotFound { kind, id },
            other => CoordinatorError::Store(other),
        }
    }
}

fn not_found_code(kind: EntityKind) -> ErrorCode {
    match kind {
        EntityKind::Table => ErrorCode::TableNotFound,
        EntityKind::Order => ErrorCode::OrderNotFound,
        EntityKind::OrderItem => ErrorCode::OrderItemNotFound,
        EntityKind::WaiterCall => ErrorCode::WaiterCallNotFound,
        EntityKind::Product => ErrorCode::ProductNotFound,
    }
}

fn transition_code(err: &TransitionError) -> ErrorCode {
    match (&err.reason, err.entity) {
        (RejectReason::InvalidRole, _) => ErrorCode::PermissionDenied,
        (RejectReason::InvalidInput(_), _) => ErrorCode::ValidationFailed,
        (_, "table") if err.from == "free" => ErrorCode::TableNotOccupied,
        (_, "table") => ErrorCode::TableNotFree,
        (_, "order") => ErrorCode::OrderNotOpen,
        (_, "item") if err.to == "removed" => ErrorCode::ItemNotRemovable,
        _ => ErrorCode::InvalidItemTransition,
    }
}

impl From<CoordinatorError> for AppError {
    fn from(err: CoordinatorError) -> Self {
        let message = err.to_string();
        match err {
            CoordinatorError::NotFound { kind, id } => {
                AppError::with_message(not_found_code(kind), message).with_detail("id", id)
            }
            CoordinatorError::UnknownQrToken => {
                AppError::with_message(ErrorCode::QrTokenInvalid, message)
            }
            CoordinatorError::Transition(e) => AppError::with_message(transition_code(&e), message)
                .with_detail("entity", e.entity)
                .with_detail("id", e.entity_id)
                .with_detail("from", e.from)
                .with_detail("to", e.to),
            CoordinatorError::OrderNotOpen(id) => {
                AppError::with_message(ErrorCode::OrderNotOpen, message).with_detail("order_id", id)
            }
            CoordinatorError::NoActiveOrder(id) => {
                AppError::with_message(ErrorCode::TableNotOccupied, message)
                    .with_detail("table_id", id)
            }
            CoordinatorError::UnresolvedItems { table_id, count } => {
                AppError::with_message(ErrorCode::UnresolvedItems, message)
                    .with_detail("table_id", table_id)
                    .with_detail("count", count)
            }
            CoordinatorError::ProductUnavailable(id) => {
                AppError::with_message(ErrorCode::ProductUnavailable, message)
                    .with_detail("product_id", id)
            }
            CoordinatorError::TableNumberTaken(number) => {
                AppError::with_message(ErrorCode::TableNumberExists, message)
                    .with_detail("number", number)
            }
            CoordinatorError::CallTransition { call_id, .. } => {
                AppError::with_message(ErrorCode::InvalidCallTransition, message)
                    .with_detail("call_id", call_id)
            }
            CoordinatorError::StaleVersion(_) => {
                AppError::with_message(ErrorCode::VersionConflict, message)
            }
            CoordinatorError::Forbidden(_) => {
                AppError::with_message(ErrorCode::PermissionDenied, message)
            }
            CoordinatorError::CpfMismatch { .. } => {
                AppError::with_message(ErrorCode::CpfMismatch, message)
            }
            CoordinatorError::Busy(e) => AppError::busy(message).with_detail("table_id", e.table_id),
            CoordinatorError::Validation(_) => AppError::validation(message),
            CoordinatorError::Store(e) => {
                tracing::error!(error = %e, "Storage error occurred");
                AppError::database(e.to_string())
            }
        }
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
