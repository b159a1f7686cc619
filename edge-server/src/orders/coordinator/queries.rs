//! Read-side queries. No locks: reads see the last committed state.

use super::{CoordinatorResult, LifecycleCoordinator, verify_customer};
use crate::orders::machine::allowed_transitions;
use crate::store::{Filter, find};
use serde::{Deserialize, Serialize};
use shared::models::{
    CallStatus, DiningTable, ItemStatus, OrderDetail, OrderItem, Role, TableStatus, WaiterCall,
};
use std::collections::HashMap;

/// Kitchen display line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenItem {
    #[serde(flatten)]
    pub item: OrderItem,
    pub table_id: i64,
    pub table_number: String,
}

impl LifecycleCoordinator {
    pub async fn get_table(&self, table_id: i64) -> CoordinatorResult<DiningTable> {
        self.load_table(table_id).await
    }

    /// All tables, optionally filtered by status, ordered by number
    pub async fn list_tables(
        &self,
        status: Option<TableStatus>,
    ) -> CoordinatorResult<Vec<DiningTable>> {
        let filter = match status {
            Some(status) => Filter::all().eq("status", status.as_str()),
            None => Filter::all(),
        };
        let mut tables: Vec<DiningTable> = find(self.store.as_ref(), &filter).await?;
        tables.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(tables)
    }

    pub async fn get_order(&self, order_id: i64) -> CoordinatorResult<OrderDetail> {
        let order = self.load_order(order_id).await?;
        let items = self.order_items(&order).await?;
        Ok(OrderDetail { order, items })
    }

    /// Customer view of their own order, gated by CPF
    pub async fn get_order_for_customer(
        &self,
        order_id: i64,
        customer_cpf: &str,
    ) -> CoordinatorResult<OrderDetail> {
        let detail = self.get_order(order_id).await?;
        verify_customer(&detail.order, Some(customer_cpf))?;
        Ok(detail)
    }

    /// Food lines the kitchen still has to act on, oldest first
    pub async fn list_kitchen_items(&self) -> CoordinatorResult<Vec<KitchenItem>> {
        let food: Vec<OrderItem> = find(
            self.store.as_ref(),
            &Filter::all().eq("product_type", "food"),
        )
        .await?;

        // order id → (table id, table number); None for orders no longer open
        let mut tables: HashMap<i64, Option<(i64, String)>> = HashMap::new();
        let mut lines = Vec::new();
        for item in food.into_iter().filter(|i| {
            matches!(
                i.status,
                ItemStatus::Pending | ItemStatus::Preparing | ItemStatus::Ready
            )
        }) {
            if !tables.contains_key(&item.order_id) {
                let order = self.load_order(item.order_id).await?;
                let table = if order.is_open() {
                    let table = self.load_table(order.table_id).await?;
                    Some((table.id, table.number))
                } else {
                    None
                };
                tables.insert(item.order_id, table);
            }
            if let Some(Some((table_id, table_number))) = tables.get(&item.order_id) {
                lines.push(KitchenItem {
                    table_id: *table_id,
                    table_number: table_number.clone(),
                    item,
                });
            }
        }
        lines.sort_by_key(|line| (line.item.created_at, line.item.id));
        Ok(lines)
    }

    /// Calls not yet resolved, oldest first
    pub async fn list_open_calls(&self) -> CoordinatorResult<Vec<WaiterCall>> {
        let mut calls: Vec<WaiterCall> = find(self.store.as_ref(), &Filter::all()).await?;
        calls.retain(|call| call.status != CallStatus::Resolved);
        calls.sort_by_key(|call| (call.created_at, call.id));
        Ok(calls)
    }

    /// Statuses `role` may move the item to right now
    pub async fn item_transitions(
        &self,
        item_id: i64,
        role: Role,
    ) -> CoordinatorResult<Vec<ItemStatus>> {
        let item = self.load_item(item_id).await?;
        Ok(allowed_transitions(item.status, item.product_type, role))
    }
}
