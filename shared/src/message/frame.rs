//! Websocket frames exchanged between a client and the gateway

use super::{RealtimeEvent, Room};
use serde::{Deserialize, Serialize};

/// Client → server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientFrame {
    /// Join the `tables` room
    JoinTableRoom,
    JoinKitchenRoom,
    JoinWaitersRoom,
    JoinReportsRoom,
    JoinSpecificTable { table_id: i64 },
    JoinSpecificOrder { order_id: i64 },
    LeaveRoom { room: Room },
    Ping,
}

impl ClientFrame {
    /// Room targeted by a join frame
    pub fn join_target(&self) -> Option<Room> {
        match self {
            ClientFrame::JoinTableRoom => Some(Room::Tables),
            ClientFrame::JoinKitchenRoom => Some(Room::Kitchen),
            ClientFrame::JoinWaitersRoom => Some(Room::Waiters),
            ClientFrame::JoinReportsRoom => Some(Room::Reports),
            ClientFrame::JoinSpecificTable { table_id } => Some(Room::Table(*table_id)),
            ClientFrame::JoinSpecificOrder { order_id } => Some(Room::Order(*order_id)),
            ClientFrame::LeaveRoom { .. } | ClientFrame::Ping => None,
        }
    }
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    Event(RealtimeEvent),
    Joined { room: Room },
    Left { room: Room },
    Error { code: u16, message: String },
    Pong,
}
