//! Order item actions: add, status change, removal

use super::{
    AddItem, CoordinatorError, CoordinatorResult, LifecycleCoordinator, authorize_order_edit,
};
use crate::orders::machine::{check_item_removal, item_transition};
use crate::orders::money::{order_total, validate_quantity};
use crate::store::WriteBatch;
use shared::message::{EventPayload, ItemDelta};
use shared::models::{Actor, ItemStatus, Order, OrderItem, Product};
use shared::util::now_millis;

const MAX_NOTES_LEN: usize = 500;

fn normalize_notes(notes: Option<String>) -> CoordinatorResult<Option<String>> {
    let Some(notes) = notes else {
        return Ok(None);
    };
    let notes = notes.trim();
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(CoordinatorError::validation(format!(
            "notes must be at most {} characters",
            MAX_NOTES_LEN
        )));
    }
    Ok((!notes.is_empty()).then(|| notes.to_string()))
}

impl LifecycleCoordinator {
    /// Append a pending line to an open order.
    ///
    /// Name, type and price are snapshotted from the catalog; later catalog
    /// edits do not touch existing lines.
    pub async fn add_item(
        &self,
        order_id: i64,
        input: AddItem,
        actor: &Actor,
    ) -> CoordinatorResult<OrderItem> {
        validate_quantity(input.quantity).map_err(CoordinatorError::Validation)?;
        let notes = normalize_notes(input.notes)?;

        let (_guard, mut order) = self.lock_order(order_id).await?;
        authorize_order_edit(&order, actor, input.customer_cpf.as_deref())?;
        if !order.is_open() {
            return Err(CoordinatorError::OrderNotOpen(order_id));
        }

        let product: Product = self.load(input.product_id).await?;
        if !product.available {
            return Err(CoordinatorError::ProductUnavailable(product.id));
        }

        let mut item = OrderItem {
            id: self.next_id(),
            order_id,
            product_id: product.id,
            product_name: product.name,
            product_type: product.product_type,
            quantity: input.quantity,
            unit_price: product.price,
            notes,
            status: ItemStatus::Pending,
            preparation_start_time: None,
            ready_time: None,
            delivered_time: None,
            created_at: now_millis(),
            version: 0,
        };

        let mut items = self.order_items(&order).await?;
        items.push(item.clone());
        order.total = order_total(&items);

        self.commit_new(
            &mut item,
            |item, id| item.id = id,
            |item| {
                let mut order = order.clone();
                order.item_ids.push(item.id);
                let mut batch = WriteBatch::new();
                batch.insert(item)?;
                batch.save(&order)?;
                Ok(batch)
            },
        )
        .await?;
        order.item_ids.push(item.id);

        tracing::info!(
            order_id,
            item_id = item.id,
            product = %item.product_name,
            quantity = item.quantity,
            role = %actor.role,
            "Item added"
        );
        self.publish([
            EventPayload::NewOrder {
                table_id: order.table_id,
                order_id,
                item: ItemDelta {
                    item_id: item.id,
                    product_name: item.product_name.clone(),
                    product_type: item.product_type,
                    quantity: item.quantity,
                    status: item.status,
                },
            },
            EventPayload::OrderUpdate {
                order_id,
                status: order.status,
            },
        ]);

        Ok(OrderItem {
            version: item.version + 1,
            ..item
        })
    }

    /// Move an item one step through its lifecycle.
    ///
    /// Two actors racing for the same transition serialize on the table
    /// lock; the loser sees the new status and is rejected as a conflict.
    pub async fn change_item_status(
        &self,
        item_id: i64,
        requested: ItemStatus,
        actor: &Actor,
    ) -> CoordinatorResult<OrderItem> {
        let order_id = self.load_item(item_id).await?.order_id;
        let (_guard, mut order) = self.lock_order(order_id).await?;
        let mut item = self.load_item(item_id).await?;

        let next = item_transition(item_id, item.status, requested, item.product_type, actor.role)?;
        if !order.is_open() {
            return Err(CoordinatorError::OrderNotOpen(order_id));
        }

        let now = now_millis();
        match next {
            ItemStatus::Preparing => item.preparation_start_time = Some(now),
            ItemStatus::Ready => item.ready_time = Some(now),
            ItemStatus::Delivered => item.delivered_time = Some(now),
            ItemStatus::Pending | ItemStatus::Canceled => {}
        }
        let previous = item.status;
        item.status = next;

        let mut batch = WriteBatch::new();
        batch.save(&item)?;
        let reprice = next == ItemStatus::Canceled;
        if reprice {
            let items: Vec<OrderItem> = self
                .order_items(&order)
                .await?
                .into_iter()
                .map(|other| if other.id == item.id { item.clone() } else { other })
                .collect();
            order.total = order_total(&items);
            batch.save(&order)?;
        }
        self.commit(batch).await?;
        item.version += 1;

        tracing::info!(
            item_id,
            order_id,
            from = %previous,
            to = %next,
            role = %actor.role,
            "Item status changed"
        );
        let mut events = vec![EventPayload::ItemStatusChanged {
            item_id,
            order_id,
            table_id: order.table_id,
            status: next,
            product_type: item.product_type,
        }];
        if reprice {
            events.push(EventPayload::OrderUpdate {
                order_id,
                status: order.status,
            });
        }
        self.publish(events);

        Ok(item)
    }

    /// Delete a line that the kitchen has not started
    pub async fn remove_item(
        &self,
        item_id: i64,
        actor: &Actor,
        customer_cpf: Option<&str>,
    ) -> CoordinatorResult<Order> {
        let order_id = self.load_item(item_id).await?.order_id;
        let (_guard, mut order) = self.lock_order(order_id).await?;
        let item = self.load_item(item_id).await?;

        check_item_removal(item_id, item.status, actor.role)?;
        authorize_order_edit(&order, actor, customer_cpf)?;
        if !order.is_open() {
            return Err(CoordinatorError::OrderNotOpen(order_id));
        }

        let items: Vec<OrderItem> = self
            .order_items(&order)
            .await?
            .into_iter()
            .filter(|other| other.id != item_id)
            .collect();
        order.item_ids.retain(|id| *id != item_id);
        order.total = order_total(&items);

        let mut batch = WriteBatch::new();
        batch.remove(&item);
        batch.save(&order)?;
        self.commit(batch).await?;
        order.version += 1;

        tracing::info!(item_id, order_id, role = %actor.role, "Item removed");
        self.publish([
            EventPayload::ItemRemoved {
                item_id,
                order_id,
                table_id: order.table_id,
                product_type: item.product_type,
            },
            EventPayload::OrderUpdate {
                order_id,
                status: order.status,
            },
        ]);

        Ok(order)
    }
}
