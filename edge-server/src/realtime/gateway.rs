//! Realtime Gateway - 连接与房间管理
//!
//! ```text
//! Coordinator ──publish(payload)──▶ RealtimeGateway
//!                                      │  compute_audience → rooms
//!                                      │  rooms → session ids (deduped)
//!                                      ├── try_send ──▶ Session A (mpsc)
//!                                      └── try_send ──▶ Session B (mpsc)
//! ```
//!
//! ## 投递策略
//!
//! - Best-effort: 队列满则丢弃并记录日志，不阻塞发布者，不回滚已提交的变更
//! - 每个连接每个事件至多一次 (joined to several target rooms = one copy)
//! - 发布顺序: sequence assignment and fan-out happen under one short
//!   lock, so every connection sees events in `seq` order

use super::router::compute_audience;
use super::session::{Session, SessionId, SessionInfo};
use dashmap::DashMap;
use parking_lot::Mutex;
use shared::message::{EventPayload, RealtimeEvent, Room};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("session {0} is not connected")]
    UnknownSession(SessionId),

    #[error("room {0} is not available to this connection")]
    NotAdmitted(Room),
}

/// Where the coordinator sends committed changes.
///
/// Implementations must not block and must never fail the caller.
pub trait EventSink: Send + Sync {
    fn publish(&self, payload: EventPayload) -> PublishReport;
}

/// Outcome of one publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    pub seq: u64,
    pub delivered: usize,
    pub dropped: usize,
}

struct SessionEntry {
    info: SessionInfo,
    tx: mpsc::Sender<RealtimeEvent>,
    rooms: HashSet<Room>,
}

pub struct RealtimeGateway {
    sessions: DashMap<SessionId, SessionEntry>,
    rooms: DashMap<Room, HashSet<SessionId>>,
    /// Last assigned sequence; guards fan-out ordering
    publish_seq: Mutex<u64>,
    queue_capacity: usize,
}

impl RealtimeGateway {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            rooms: DashMap::new(),
            publish_seq: Mutex::new(0),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Register a connection. The returned session leaves every room when
    /// dropped.
    pub fn connect(self: &Arc<Self>, info: SessionInfo) -> Session {
        let id = SessionId::new_v4();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        tracing::debug!(session = %id, role = %info.role, "Realtime session connected");
        self.sessions.insert(
            id,
            SessionEntry {
                info,
                tx,
                rooms: HashSet::new(),
            },
        );
        Session::new(id, self.clone(), rx)
    }

    /// Remove a connection from every room
    pub fn disconnect(&self, id: SessionId) {
        let Some((_, entry)) = self.sessions.remove(&id) else {
            return;
        };
        for room in &entry.rooms {
            self.remove_member(room, id);
        }
        tracing::debug!(session = %id, rooms = entry.rooms.len(), "Realtime session disconnected");
    }

    pub fn join(&self, id: SessionId, room: Room) -> Result<(), GatewayError> {
        {
            let mut entry = self
                .sessions
                .get_mut(&id)
                .ok_or(GatewayError::UnknownSession(id))?;
            if !room.admits(entry.info.role, entry.info.own_order) {
                tracing::warn!(session = %id, %room, role = %entry.info.role, "Room join refused");
                return Err(GatewayError::NotAdmitted(room));
            }
            entry.rooms.insert(room);
        }
        // sessions guard released before touching rooms
        self.rooms.entry(room).or_default().insert(id);
        Ok(())
    }

    pub fn leave(&self, id: SessionId, room: Room) -> Result<(), GatewayError> {
        {
            let mut entry = self
                .sessions
                .get_mut(&id)
                .ok_or(GatewayError::UnknownSession(id))?;
            entry.rooms.remove(&room);
        }
        self.remove_member(&room, id);
        Ok(())
    }

    fn remove_member(&self, room: &Room, id: SessionId) {
        self.rooms.remove_if_mut(room, |_, members| {
            members.remove(&id);
            members.is_empty()
        });
    }

    pub fn rooms_of(&self, id: SessionId) -> Vec<Room> {
        self.sessions
            .get(&id)
            .map(|entry| entry.rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn room_size(&self, room: &Room) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    fn audience(&self, rooms: impl IntoIterator<Item = Room>) -> HashSet<SessionId> {
        let mut targets = HashSet::new();
        for room in rooms {
            if let Some(members) = self.rooms.get(&room) {
                targets.extend(members.iter().copied());
            }
        }
        targets
    }

    fn deliver(&self, payload: EventPayload) -> PublishReport {
        let rooms = compute_audience(&payload);

        let mut seq_guard = self.publish_seq.lock();
        *seq_guard += 1;
        let event = RealtimeEvent {
            seq: *seq_guard,
            timestamp: shared::util::now_millis(),
            payload,
        };

        let mut report = PublishReport {
            seq: event.seq,
            ..Default::default()
        };
        for id in self.audience(rooms) {
            let Some(entry) = self.sessions.get(&id) else {
                continue;
            };
            match entry.tx.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    report.dropped += 1;
                    tracing::warn!(
                        session = %id,
                        event = event.payload.name(),
                        seq = event.seq,
                        "Session queue full, event dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    report.dropped += 1;
                    tracing::debug!(session = %id, "Session closed, event dropped");
                }
            }
        }
        drop(seq_guard);

        tracing::debug!(
            event = event.payload.name(),
            seq = report.seq,
            delivered = report.delivered,
            dropped = report.dropped,
            "Event published"
        );
        report
    }
}

impl EventSink for RealtimeGateway {
    fn publish(&self, payload: EventPayload) -> PublishReport {
        self.deliver(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{ItemStatus, ProductType, Role, TableStatus};

    fn create_test_gateway() -> Arc<RealtimeGateway> {
        Arc::new(RealtimeGateway::new(8))
    }

    fn table_update(table_id: i64) -> EventPayload {
        EventPayload::TableUpdate {
            table_id,
            status: TableStatus::Occupied,
        }
    }

    fn item_ready(product_type: ProductType) -> EventPayload {
        EventPayload::ItemStatusChanged {
            item_id: 1,
            order_id: 22,
            table_id: 5,
            status: ItemStatus::Ready,
            product_type,
        }
    }

    #[tokio::test]
    async fn test_delivers_to_room_members_only() {
        let gateway = create_test_gateway();
        let mut dashboard = gateway.connect(SessionInfo::staff(1, Role::Admin));
        let mut kitchen = gateway.connect(SessionInfo::staff(2, Role::Kitchen));
        dashboard.join(Room::Tables).unwrap();
        kitchen.join(Room::Kitchen).unwrap();

        let report = gateway.publish(table_update(5));
        assert_eq!(report.delivered, 1);

        let event = dashboard.try_recv().unwrap();
        assert_eq!(event.payload, table_update(5));
        assert!(kitchen.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_one_copy_per_connection() {
        let gateway = create_test_gateway();
        let mut session = gateway.connect(SessionInfo::staff(1, Role::Admin));
        session.join(Room::Tables).unwrap();
        session.join(Room::Reports).unwrap();
        session.join(Room::Table(5)).unwrap();

        let report = gateway.publish(table_update(5));
        assert_eq!(report.delivered, 1);
        assert!(session.try_recv().is_some());
        assert!(session.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_beverage_not_delivered_to_kitchen_room() {
        let gateway = create_test_gateway();
        let mut kitchen = gateway.connect(SessionInfo::staff(2, Role::Kitchen));
        let mut waiters = gateway.connect(SessionInfo::staff(3, Role::Waiter));
        kitchen.join(Room::Kitchen).unwrap();
        waiters.join(Room::Waiters).unwrap();

        gateway.publish(item_ready(ProductType::Beverage));
        assert!(kitchen.try_recv().is_none());
        assert!(waiters.try_recv().is_some());

        gateway.publish(item_ready(ProductType::Food));
        assert!(kitchen.try_recv().is_some());
        assert!(waiters.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_publish_order_preserved() {
        let gateway = create_test_gateway();
        let mut session = gateway.connect(SessionInfo::staff(1, Role::Admin));
        session.join(Room::Tables).unwrap();

        for table_id in 1..=5 {
            gateway.publish(table_update(table_id));
        }
        let seqs: Vec<u64> = std::iter::from_fn(|| session.try_recv())
            .map(|e| e.seq)
            .collect();
        assert_eq!(seqs.len(), 5);
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let gateway = Arc::new(RealtimeGateway::new(2));
        let mut slow = gateway.connect(SessionInfo::staff(1, Role::Admin));
        slow.join(Room::Tables).unwrap();

        let reports: Vec<_> = (0..4).map(|i| gateway.publish(table_update(i))).collect();
        assert_eq!(reports.iter().map(|r| r.delivered).sum::<usize>(), 2);
        assert_eq!(reports.iter().map(|r| r.dropped).sum::<usize>(), 2);
        assert!(slow.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_drop_removes_from_all_rooms() {
        let gateway = create_test_gateway();
        let session = gateway.connect(SessionInfo::staff(1, Role::Waiter));
        session.join(Room::Waiters).unwrap();
        session.join(Room::Table(5)).unwrap();
        assert_eq!(gateway.room_size(&Room::Waiters), 1);

        drop(session);
        assert_eq!(gateway.session_count(), 0);
        assert_eq!(gateway.room_size(&Room::Waiters), 0);
        assert_eq!(gateway.room_size(&Room::Table(5)), 0);
    }

    #[tokio::test]
    async fn test_leave_room() {
        let gateway = create_test_gateway();
        let mut session = gateway.connect(SessionInfo::staff(1, Role::Waiter));
        session.join(Room::Waiters).unwrap();
        session.leave(Room::Waiters).unwrap();
        assert!(session.rooms().is_empty());

        gateway.publish(item_ready(ProductType::Food));
        assert!(session.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_customer_confined_to_own_order() {
        let gateway = create_test_gateway();
        let session = gateway.connect(SessionInfo::customer(22));
        assert!(session.join(Room::Order(22)).is_ok());
        assert_eq!(
            session.join(Room::Order(23)),
            Err(GatewayError::NotAdmitted(Room::Order(23)))
        );
        assert_eq!(
            session.join(Room::Kitchen),
            Err(GatewayError::NotAdmitted(Room::Kitchen))
        );
    }
}
