use super::gateway::{GatewayError, RealtimeGateway};
use shared::message::{RealtimeEvent, Room};
use shared::models::Role;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type SessionId = Uuid;

/// Who is on the other end of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub role: Role,
    pub user_id: Option<i64>,
    /// Customer connections are bound to one order
    pub own_order: Option<i64>,
}

impl SessionInfo {
    pub fn staff(user_id: i64, role: Role) -> Self {
        Self {
            role,
            user_id: Some(user_id),
            own_order: None,
        }
    }

    pub fn customer(order_id: i64) -> Self {
        Self {
            role: Role::Customer,
            user_id: None,
            own_order: Some(order_id),
        }
    }
}

/// One live connection.
///
/// Passed explicitly to whatever serves the connection; there is no global
/// socket. Dropping the session removes it from every room.
pub struct Session {
    id: SessionId,
    gateway: Arc<RealtimeGateway>,
    rx: mpsc::Receiver<RealtimeEvent>,
}

impl Session {
    pub(super) fn new(
        id: SessionId,
        gateway: Arc<RealtimeGateway>,
        rx: mpsc::Receiver<RealtimeEvent>,
    ) -> Self {
        Self { id, gateway, rx }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn join(&self, room: Room) -> Result<(), GatewayError> {
        self.gateway.join(self.id, room)
    }

    pub fn leave(&self, room: Room) -> Result<(), GatewayError> {
        self.gateway.leave(self.id, room)
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.gateway.rooms_of(self.id)
    }

    /// Next event; `None` once the gateway side is gone
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting
    pub fn try_recv(&mut self) -> Option<RealtimeEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.gateway.disconnect(self.id);
    }
}
