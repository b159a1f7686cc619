//! Room Router - 事件受众计算
//!
//! Pure mapping from an event to the rooms that must hear about it.
//!
//! | Event | Rooms |
//! |-------|-------|
//! | table mutation | `table:{id}`, `tables`, `reports` |
//! | item mutation | `waiters`, `order:{id}` (+ `kitchen` when food) |
//! | new item | as item mutation, + `reports` |
//! | order opened/closed/canceled | `order:{id}`, `table:{id}`, `waiters`, `reports` |
//! | order fields changed | `order:{id}`, `waiters` |
//! | bill requested | `waiters`, `table:{id}` |
//! | waiter call | `waiters` |
//! | delay alert | `kitchen`, `waiters` |
//!
//! The customer app only ever joins its own `order:{id}` room, so nothing
//! here may route staff-only detail through order rooms.

use shared::message::{EventPayload, Room};
use shared::models::ProductType;
use std::collections::BTreeSet;

fn item_rooms(order_id: i64, product_type: ProductType) -> BTreeSet<Room> {
    let mut rooms = BTreeSet::from([Room::Waiters, Room::Order(order_id)]);
    if product_type == ProductType::Food {
        rooms.insert(Room::Kitchen);
    }
    rooms
}

/// Rooms that must receive `payload`
pub fn compute_audience(payload: &EventPayload) -> BTreeSet<Room> {
    match payload {
        EventPayload::TableUpdate { table_id, .. } => {
            BTreeSet::from([Room::Table(*table_id), Room::Tables, Room::Reports])
        }
        EventPayload::NewOrder { order_id, item, .. } => {
            let mut rooms = item_rooms(*order_id, item.product_type);
            rooms.insert(Room::Reports);
            rooms
        }
        EventPayload::ItemStatusChanged {
            order_id,
            product_type,
            ..
        }
        | EventPayload::ItemRemoved {
            order_id,
            product_type,
            ..
        } => item_rooms(*order_id, *product_type),
        EventPayload::OrderStatusChanged {
            order_id, table_id, ..
        } => BTreeSet::from([
            Room::Order(*order_id),
            Room::Table(*table_id),
            Room::Waiters,
            Room::Reports,
        ]),
        EventPayload::OrderUpdate { order_id, .. } => {
            BTreeSet::from([Room::Order(*order_id), Room::Waiters])
        }
        EventPayload::BillRequested { table_id, .. } => {
            BTreeSet::from([Room::Waiters, Room::Table(*table_id)])
        }
        EventPayload::WaiterCalled { .. } | EventPayload::WaiterCallUpdated { .. } => {
            BTreeSet::from([Room::Waiters])
        }
        EventPayload::DelayAlert { .. } => BTreeSet::from([Room::Kitchen, Room::Waiters]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{DelaySeverity, ItemDelta};
    use shared::models::{CallReason, ItemStatus, OrderStatus, TableStatus};

    fn item_changed(product_type: ProductType) -> EventPayload {
        EventPayload::ItemStatusChanged {
            item_id: 1,
            order_id: 22,
            table_id: 5,
            status: ItemStatus::Ready,
            product_type,
        }
    }

    #[test]
    fn test_table_mutation() {
        let rooms = compute_audience(&EventPayload::TableUpdate {
            table_id: 5,
            status: TableStatus::Occupied,
        });
        assert_eq!(
            rooms,
            BTreeSet::from([Room::Table(5), Room::Tables, Room::Reports])
        );
    }

    #[test]
    fn test_food_item_reaches_kitchen() {
        let rooms = compute_audience(&item_changed(ProductType::Food));
        assert_eq!(
            rooms,
            BTreeSet::from([Room::Kitchen, Room::Waiters, Room::Order(22)])
        );
    }

    #[test]
    fn test_beverage_item_skips_kitchen() {
        let rooms = compute_audience(&item_changed(ProductType::Beverage));
        assert!(!rooms.contains(&Room::Kitchen));
        assert!(rooms.contains(&Room::Waiters));
        assert!(rooms.contains(&Room::Order(22)));
    }

    #[test]
    fn test_new_item_feeds_reports() {
        let rooms = compute_audience(&EventPayload::NewOrder {
            table_id: 5,
            order_id: 22,
            item: ItemDelta {
                item_id: 1,
                product_name: "Suco".into(),
                product_type: ProductType::Beverage,
                quantity: 1,
                status: ItemStatus::Pending,
            },
        });
        assert_eq!(
            rooms,
            BTreeSet::from([Room::Waiters, Room::Reports, Room::Order(22)])
        );
    }

    #[test]
    fn test_order_closed_feeds_reports() {
        let rooms = compute_audience(&EventPayload::OrderStatusChanged {
            order_id: 22,
            table_id: 5,
            status: OrderStatus::Closed,
        });
        assert!(rooms.contains(&Room::Reports));
        assert!(rooms.contains(&Room::Order(22)));
    }

    #[test]
    fn test_waiter_calls_only_reach_waiters() {
        let rooms = compute_audience(&EventPayload::WaiterCalled {
            call_id: 1,
            table_id: 5,
            customer: "Ana".into(),
            reason: CallReason::Bill,
        });
        assert_eq!(rooms, BTreeSet::from([Room::Waiters]));
    }

    #[test]
    fn test_customer_rooms_never_include_staff_alerts() {
        let rooms = compute_audience(&EventPayload::DelayAlert {
            item_id: 1,
            table_number: "5".into(),
            product_name: "Feijoada".into(),
            severity: DelaySeverity::Warning,
        });
        assert!(rooms.iter().all(|room| !matches!(room, Room::Order(_))));
    }
}
