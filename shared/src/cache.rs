//! Client-side view of server state
//!
//! Clients apply their own changes optimistically, then reconcile with the
//! authoritative events pushed by the gateway. Reconciliation is
//! last-write-wins by event stamp (publish sequence, then commit timestamp),
//! never by arrival order: a late event carrying an older stamp is ignored,
//! and any authoritative event newer than what an optimistic change was based
//! on replaces it, even when that reverts the change.

use crate::message::{EntityKey, RealtimeEvent};
use std::collections::HashMap;
use std::hash::Hash;

/// Ordering key of an authoritative event
///
/// 字段顺序即比较顺序: `seq` 由网关单调分配, 时间戳只在序号相同时参与比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp {
    pub seq: u64,
    pub timestamp: i64,
}

impl Stamp {
    pub fn of(event: &RealtimeEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            seq: event.seq,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot<V> {
    confirmed: Option<(V, Stamp)>,
    optimistic: Option<V>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            confirmed: None,
            optimistic: None,
        }
    }
}

/// Reducible cache keyed by entity id
#[derive(Debug, Clone)]
pub struct LocalView<K, V> {
    slots: HashMap<K, Slot<V>>,
}

impl<K, V> Default for LocalView<K, V> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> LocalView<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value: the pending optimistic change if any, else the last
    /// confirmed value.
    pub fn get(&self, key: &K) -> Option<&V> {
        let slot = self.slots.get(key)?;
        slot.optimistic
            .as_ref()
            .or(slot.confirmed.as_ref().map(|(v, _)| v))
    }

    /// Whether the key carries an unconfirmed local change
    pub fn is_pending(&self, key: &K) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.optimistic.is_some())
    }

    /// Record a local change before the server confirms it
    pub fn apply_optimistic(&mut self, key: K, value: V) {
        self.slots.entry(key).or_default().optimistic = Some(value);
    }

    /// Apply an authoritative value.
    ///
    /// Returns `false` when the stamp is not newer than the confirmed one;
    /// the event is stale and the view is left untouched.
    pub fn apply_authoritative(&mut self, key: K, value: V, stamp: Stamp) -> bool {
        let slot = self.slots.entry(key).or_default();
        if let Some((_, current)) = &slot.confirmed
            && *current >= stamp
        {
            return false;
        }
        slot.confirmed = Some((value, stamp));
        slot.optimistic = None;
        true
    }

    /// Drop a local change, e.g. after the server rejected the action
    pub fn rollback(&mut self, key: &K) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.optimistic = None;
            if slot.confirmed.is_none() {
                self.slots.remove(key);
            }
        }
    }

    /// Forget everything; used on reconnect before a full re-fetch
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<V: Clone> LocalView<EntityKey, V> {
    /// Reduce a pushed event into the view using `project` to extract the
    /// cached value. Events without an entity key, or that `project`
    /// ignores, leave the view untouched.
    pub fn apply_event(
        &mut self,
        event: &RealtimeEvent,
        project: impl FnOnce(&RealtimeEvent) -> Option<V>,
    ) -> bool {
        let Some(key) = event.payload.entity_key() else {
            return false;
        };
        let Some(value) = project(event) else {
            return false;
        };
        self.apply_authoritative(key, value, Stamp::of(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::EventPayload;
    use crate::models::TableStatus;

    fn stamp(timestamp: i64, seq: u64) -> Stamp {
        Stamp { timestamp, seq }
    }

    fn table_event(seq: u64, timestamp: i64, status: TableStatus) -> RealtimeEvent {
        RealtimeEvent {
            seq,
            timestamp,
            payload: EventPayload::TableUpdate {
                table_id: 5,
                status,
            },
        }
    }

    fn table_status(event: &RealtimeEvent) -> Option<TableStatus> {
        match &event.payload {
            EventPayload::TableUpdate { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[test]
    fn test_last_write_wins_by_stamp_not_arrival() {
        let mut view: LocalView<i64, &str> = LocalView::new();
        assert!(view.apply_authoritative(1, "newer", stamp(200, 2)));
        assert!(!view.apply_authoritative(1, "older", stamp(100, 1)));
        assert_eq!(view.get(&1), Some(&"newer"));
    }

    #[test]
    fn test_same_timestamp_ordered_by_seq() {
        let mut view: LocalView<i64, &str> = LocalView::new();
        assert!(view.apply_authoritative(1, "a", stamp(100, 1)));
        assert!(view.apply_authoritative(1, "b", stamp(100, 2)));
        assert!(!view.apply_authoritative(1, "c", stamp(100, 2)));
        assert_eq!(view.get(&1), Some(&"b"));
    }

    #[test]
    fn test_higher_seq_wins_over_skewed_clock() {
        let mut view: LocalView<i64, &str> = LocalView::new();
        // commit clock stepped backwards between the two events
        assert!(view.apply_authoritative(1, "first", stamp(200, 1)));
        assert!(view.apply_authoritative(1, "second", stamp(100, 2)));
        assert_eq!(view.get(&1), Some(&"second"));

        // a replay of the first event stays ignored
        assert!(!view.apply_authoritative(1, "first", stamp(200, 1)));
        assert_eq!(view.get(&1), Some(&"second"));
    }

    #[test]
    fn test_stamp_orders_by_seq_first() {
        assert!(stamp(100, 2) > stamp(200, 1));
        assert!(stamp(100, 2) < stamp(101, 2));
    }

    #[test]
    fn test_server_event_reverts_optimistic_change() {
        let mut view: LocalView<i64, &str> = LocalView::new();
        view.apply_authoritative(1, "pending", stamp(100, 1));
        view.apply_optimistic(1, "preparing");
        assert_eq!(view.get(&1), Some(&"preparing"));
        assert!(view.is_pending(&1));

        // someone else's change wins; our optimistic value is discarded
        assert!(view.apply_authoritative(1, "canceled", stamp(150, 2)));
        assert_eq!(view.get(&1), Some(&"canceled"));
        assert!(!view.is_pending(&1));
    }

    #[test]
    fn test_rollback() {
        let mut view: LocalView<i64, &str> = LocalView::new();
        view.apply_optimistic(7, "ghost");
        view.rollback(&7);
        assert!(view.get(&7).is_none());
        assert!(view.is_empty());

        view.apply_authoritative(8, "real", stamp(1, 1));
        view.apply_optimistic(8, "local");
        view.rollback(&8);
        assert_eq!(view.get(&8), Some(&"real"));
    }

    #[test]
    fn test_apply_event_projection() {
        let mut view: LocalView<EntityKey, TableStatus> = LocalView::new();
        assert!(view.apply_event(&table_event(2, 200, TableStatus::Occupied), table_status));
        assert!(!view.apply_event(&table_event(1, 100, TableStatus::Free), table_status));
        assert_eq!(view.get(&EntityKey::Table(5)), Some(&TableStatus::Occupied));
    }
}
