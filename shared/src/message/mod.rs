//! 实时消息类型定义
//!
//! Events pushed by the edge server to connected clients. Payloads are
//! small state deltas (ids + new status); clients re-fetch full objects
//! over HTTP when they need them.

use crate::models::{CallReason, CallStatus, ItemStatus, OrderStatus, ProductType, TableStatus};
use serde::{Deserialize, Serialize};

pub mod frame;
pub mod room;

pub use frame::{ClientFrame, ServerFrame};
pub use room::{InvalidRoom, Room};

/// Severity of a preparation delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelaySeverity {
    Warning,
    Critical,
}

/// Minimal description of a newly submitted item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDelta {
    pub item_id: i64,
    pub product_name: String,
    pub product_type: ProductType,
    pub quantity: u32,
    pub status: ItemStatus,
}

/// Event payload, tagged by event name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum EventPayload {
    /// Occupancy, waiter or QR token changed
    TableUpdate { table_id: i64, status: TableStatus },
    /// Order fields changed (total, bill flag, waiter, table)
    OrderUpdate { order_id: i64, status: OrderStatus },
    /// Item submitted
    NewOrder {
        table_id: i64,
        order_id: i64,
        item: ItemDelta,
    },
    ItemStatusChanged {
        item_id: i64,
        order_id: i64,
        table_id: i64,
        status: ItemStatus,
        product_type: ProductType,
    },
    ItemRemoved {
        item_id: i64,
        order_id: i64,
        table_id: i64,
        product_type: ProductType,
    },
    /// Order opened, closed or canceled
    OrderStatusChanged {
        order_id: i64,
        table_id: i64,
        status: OrderStatus,
    },
    BillRequested {
        table_id: i64,
        order_id: i64,
        customer: String,
    },
    WaiterCalled {
        call_id: i64,
        table_id: i64,
        customer: String,
        reason: CallReason,
    },
    WaiterCallUpdated {
        call_id: i64,
        table_id: i64,
        status: CallStatus,
        waiter_id: Option<i64>,
    },
    DelayAlert {
        item_id: i64,
        table_number: String,
        product_name: String,
        severity: DelaySeverity,
    },
}

impl EventPayload {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            EventPayload::TableUpdate { .. } => "tableUpdate",
            EventPayload::OrderUpdate { .. } => "orderUpdate",
            EventPayload::NewOrder { .. } => "newOrder",
            EventPayload::ItemStatusChanged { .. } => "itemStatusChanged",
            EventPayload::ItemRemoved { .. } => "itemRemoved",
            EventPayload::OrderStatusChanged { .. } => "orderStatusChanged",
            EventPayload::BillRequested { .. } => "billRequested",
            EventPayload::WaiterCalled { .. } => "waiterCalled",
            EventPayload::WaiterCallUpdated { .. } => "waiterCallUpdated",
            EventPayload::DelayAlert { .. } => "delayAlert",
        }
    }

    /// The entity whose state this event describes, for client caches
    pub fn entity_key(&self) -> Option<EntityKey> {
        match self {
            EventPayload::TableUpdate { table_id, .. } => Some(EntityKey::Table(*table_id)),
            EventPayload::OrderUpdate { order_id, .. }
            | EventPayload::OrderStatusChanged { order_id, .. }
            | EventPayload::BillRequested { order_id, .. } => Some(EntityKey::Order(*order_id)),
            EventPayload::NewOrder { item, .. } => Some(EntityKey::Item(item.item_id)),
            EventPayload::ItemStatusChanged { item_id, .. }
            | EventPayload::ItemRemoved { item_id, .. } => Some(EntityKey::Item(*item_id)),
            EventPayload::WaiterCalled { call_id, .. }
            | EventPayload::WaiterCallUpdated { call_id, .. } => Some(EntityKey::Call(*call_id)),
            EventPayload::DelayAlert { .. } => None,
        }
    }
}

/// Entity identity used to key client-side caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityKey {
    Table(i64),
    Order(i64),
    Item(i64),
    Call(i64),
}

/// Envelope for every pushed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// Gateway-wide publish sequence, strictly increasing
    pub seq: u64,
    /// Commit time (Unix millis)
    pub timestamp: i64,
    pub payload: EventPayload,
}
