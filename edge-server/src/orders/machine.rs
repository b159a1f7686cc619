//! State Machine Engine
//!
//! Pure transition rules for tables, orders and order items. No I/O: the
//! coordinator loads entities, asks here whether a transition is legal,
//! then persists the result.
//!
//! Role is checked before source state. A role that may never perform the
//! requested transition is rejected with [`RejectReason::InvalidRole`]; a
//! permitted role asking from the wrong state gets
//! [`RejectReason::InvalidSourceState`] or [`RejectReason::TerminalState`].
//!
//! ```text
//! Table:  free ──open──▶ occupied ──request close──▶ waiting_payment
//!           ▲               │  │                        │
//!           └────close──────┘  └──transfer (dest free)──┘
//!
//! Item:   pending ──▶ preparing ──▶ ready ──▶ delivered
//!            │            │
//!            └────────────┴──▶ canceled
//! ```

use shared::models::{ItemStatus, OrderStatus, PaymentMethod, ProductType, Role, TableStatus};
use std::fmt;
use thiserror::Error;

/// Why a transition was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidRole,
    InvalidSourceState,
    TerminalState,
    /// Malformed input (zero occupants, missing payment method)
    InvalidInput(&'static str),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidRole => f.write_str("invalid role"),
            RejectReason::InvalidSourceState => f.write_str("invalid source state"),
            RejectReason::TerminalState => f.write_str("terminal state"),
            RejectReason::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

/// A rejected transition, naming entity, attempted change, actor and reason
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} {entity_id}: {from} -> {to} rejected for {role}: {reason}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub entity_id: i64,
    pub from: String,
    pub to: String,
    pub role: Role,
    pub reason: RejectReason,
}

impl TransitionError {
    fn new(
        entity: &'static str,
        entity_id: i64,
        from: impl fmt::Display,
        to: impl fmt::Display,
        role: Role,
        reason: RejectReason,
    ) -> Self {
        Self {
            entity,
            entity_id,
            from: from.to_string(),
            to: to.to_string(),
            role,
            reason,
        }
    }
}

pub type TransitionResult<T> = Result<T, TransitionError>;

// ========================================================================
// Table
// ========================================================================

/// Requested table action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    Open { occupants: u32 },
    RequestClose,
    Close { payment_method: Option<PaymentMethod> },
    /// Source side of a transfer
    TransferOut,
    /// Destination side of a transfer
    TransferIn,
    AssignWaiter,
}

impl TableAction {
    fn name(&self) -> &'static str {
        match self {
            TableAction::Open { .. } => "open",
            TableAction::RequestClose => "request_close",
            TableAction::Close { .. } => "close",
            TableAction::TransferOut => "transfer_out",
            TableAction::TransferIn => "transfer_in",
            TableAction::AssignWaiter => "assign_waiter",
        }
    }

    fn role_allowed(&self, role: Role) -> bool {
        match self {
            // customers open through the table's QR code
            TableAction::Open { .. } => true,
            TableAction::RequestClose => role.is_staff(),
            TableAction::Close { .. }
            | TableAction::TransferOut
            | TableAction::TransferIn
            | TableAction::AssignWaiter => role.is_front_of_house(),
        }
    }
}

/// Validate a table action and return the resulting status
pub fn table_transition(
    table_id: i64,
    current: TableStatus,
    action: TableAction,
    role: Role,
) -> TransitionResult<TableStatus> {
    let reject = |reason| {
        Err(TransitionError::new(
            "table",
            table_id,
            current,
            action.name(),
            role,
            reason,
        ))
    };

    if !action.role_allowed(role) {
        return reject(RejectReason::InvalidRole);
    }

    match (action, current) {
        (TableAction::Open { occupants }, TableStatus::Free) => {
            if occupants == 0 {
                return reject(RejectReason::InvalidInput("occupants must be greater than 0"));
            }
            Ok(TableStatus::Occupied)
        }
        (TableAction::RequestClose, TableStatus::Occupied) => Ok(TableStatus::WaitingPayment),
        (
            TableAction::Close { payment_method },
            TableStatus::Occupied | TableStatus::WaitingPayment,
        ) => {
            if payment_method.is_none() {
                return reject(RejectReason::InvalidInput("payment method is required"));
            }
            Ok(TableStatus::Free)
        }
        (TableAction::TransferOut, TableStatus::Occupied | TableStatus::WaitingPayment) => {
            Ok(TableStatus::Free)
        }
        (TableAction::TransferIn, TableStatus::Free) => Ok(TableStatus::Occupied),
        (TableAction::AssignWaiter, status) => Ok(status),
        _ => reject(RejectReason::InvalidSourceState),
    }
}

// ========================================================================
// Order
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    /// Finalized by closing its table
    Close,
    /// Administrative override
    Cancel,
}

pub fn order_transition(
    order_id: i64,
    current: OrderStatus,
    action: OrderAction,
    role: Role,
) -> TransitionResult<OrderStatus> {
    let (target, allowed) = match action {
        OrderAction::Close => (OrderStatus::Closed, role.is_front_of_house()),
        OrderAction::Cancel => (OrderStatus::Canceled, role.is_management()),
    };
    let reject = |reason| {
        Err(TransitionError::new(
            "order", order_id, current, target, role, reason,
        ))
    };
    if !allowed {
        return reject(RejectReason::InvalidRole);
    }
    match current {
        OrderStatus::Open => Ok(target),
        OrderStatus::Closed | OrderStatus::Canceled => reject(RejectReason::TerminalState),
    }
}

// ========================================================================
// Order item
// ========================================================================

/// Statuses a client may request, in lifecycle order
const REQUESTABLE: [ItemStatus; 4] = [
    ItemStatus::Preparing,
    ItemStatus::Ready,
    ItemStatus::Delivered,
    ItemStatus::Canceled,
];

fn item_role_allowed(target: ItemStatus, product_type: ProductType, role: Role) -> bool {
    match target {
        ItemStatus::Preparing | ItemStatus::Ready => {
            role.is_front_of_house() || (role == Role::Kitchen && product_type == ProductType::Food)
        }
        // delivery and cancellation are front-of-house concerns
        ItemStatus::Delivered | ItemStatus::Canceled => role.is_front_of_house(),
        // nothing moves back to pending
        ItemStatus::Pending => role.is_staff(),
    }
}

fn item_source_allowed(current: ItemStatus, target: ItemStatus) -> bool {
    matches!(
        (current, target),
        (ItemStatus::Pending, ItemStatus::Preparing)
            | (ItemStatus::Preparing, ItemStatus::Ready)
            | (ItemStatus::Ready, ItemStatus::Delivered)
            | (ItemStatus::Pending | ItemStatus::Preparing, ItemStatus::Canceled)
    )
}

/// Validate an item status change; never skips a state
pub fn item_transition(
    item_id: i64,
    current: ItemStatus,
    requested: ItemStatus,
    product_type: ProductType,
    role: Role,
) -> TransitionResult<ItemStatus> {
    let reject = |reason| {
        Err(TransitionError::new(
            "item", item_id, current, requested, role, reason,
        ))
    };
    if !item_role_allowed(requested, product_type, role) {
        return reject(RejectReason::InvalidRole);
    }
    if current.is_terminal() {
        return reject(RejectReason::TerminalState);
    }
    if !item_source_allowed(current, requested) {
        return reject(RejectReason::InvalidSourceState);
    }
    Ok(requested)
}

/// Statuses `role` may move the item to right now.
///
/// Clients render their buttons from this instead of re-deriving the rules.
pub fn allowed_transitions(
    current: ItemStatus,
    product_type: ProductType,
    role: Role,
) -> Vec<ItemStatus> {
    REQUESTABLE
        .into_iter()
        .filter(|target| item_transition(0, current, *target, product_type, role).is_ok())
        .collect()
}

/// Removal deletes the line outright, so it is only allowed before the
/// kitchen has started on it.
pub fn check_item_removal(item_id: i64, current: ItemStatus, role: Role) -> TransitionResult<()> {
    let reject = |reason| {
        Err(TransitionError::new(
            "item", item_id, current, "removed", role, reason,
        ))
    };
    if !(role.is_front_of_house() || role == Role::Customer) {
        return reject(RejectReason::InvalidRole);
    }
    if current != ItemStatus::Pending {
        return reject(RejectReason::InvalidSourceState);
    }
    Ok(())
}
