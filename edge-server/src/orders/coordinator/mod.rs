//! Lifecycle Coordinator - 桌台/订单生命周期协调
//!
//! The only writer of tables, orders, items and waiter calls. Every action
//! follows the same shape:
//!
//! ```text
//! lock(table) → load → machine check → mutate → commit(batch) → publish → unlock
//! ```
//!
//! Events are published after the commit succeeds and before the table lock
//! is released, so per-table event order matches commit order. A failed
//! commit publishes nothing.

mod calls;
mod catalog;
mod error;
mod items;
mod queries;
mod tables;

#[cfg(test)]
mod tests;

pub use error::{CoordinatorError, CoordinatorResult, ErrorKind};
pub use queries::KitchenItem;

use super::locks::{LockTimeout, TableGuard, TableLocks};
use crate::realtime::EventSink;
use crate::store::{Entity, EntityStore, Filter, StoreError, WriteBatch, fetch, find};
use serde::{Deserialize, Serialize};
use shared::message::EventPayload;
use shared::models::{
    Actor, CallReason, CustomerInfo, DiningTable, Order, OrderItem, OrderType, Role, WaiterCall,
};
use shared::util::{normalize_cpf, snowflake_id};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// How many times an order-scoped action re-resolves its table when a
/// concurrent transfer moves the order
const RELOCK_ATTEMPTS: usize = 3;

/// Generated ids per insert: the first draw plus one retry on collision
const ID_ATTEMPTS: usize = 2;

/// Generator for new entity ids
pub type IdSource = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Open a free table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenTable {
    pub occupants: u32,
    /// Defaults to the table's assigned waiter, then the acting waiter
    pub waiter_id: Option<i64>,
    /// Required when a customer opens through the QR code
    pub customer: Option<CustomerInfo>,
}

/// Add one line to an open order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItem {
    pub product_id: i64,
    pub quantity: u32,
    pub notes: Option<String>,
    /// Customer credential for self-service orders
    pub customer_cpf: Option<String>,
}

/// Customer request for a waiter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallWaiter {
    pub reason: CallReason,
    pub custom_reason: Option<String>,
    pub customer_cpf: String,
}

pub struct LifecycleCoordinator {
    store: Arc<dyn EntityStore>,
    events: Arc<dyn EventSink>,
    locks: TableLocks,
    /// Serializes table creation; the number check spans all tables
    admin: Mutex<()>,
    ids: IdSource,
}

impl LifecycleCoordinator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        events: Arc<dyn EventSink>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            store,
            events,
            locks: TableLocks::new(lock_timeout),
            admin: Mutex::new(()),
            ids: Arc::new(snowflake_id),
        }
    }

    /// Replace the id generator
    pub fn with_id_source(mut self, ids: IdSource) -> Self {
        self.ids = ids;
        self
    }

    fn next_id(&self) -> i64 {
        (self.ids)()
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    // ========================================================================
    // Locking
    // ========================================================================

    async fn lock_table(&self, table_id: i64) -> CoordinatorResult<TableGuard> {
        self.locks.acquire(table_id).await.map_err(|e| {
            tracing::warn!(table_id, waited_ms = e.waited.as_millis() as u64, "Table lock timed out");
            CoordinatorError::Busy(e)
        })
    }

    /// Lock the table that currently owns entity `id`.
    ///
    /// The entity is re-read under the lock; if a transfer moved it in the
    /// meantime the lock is released and the new table is tried.
    async fn lock_owner<T: Entity>(
        &self,
        id: i64,
        table_of: fn(&T) -> i64,
    ) -> CoordinatorResult<(TableGuard, T)> {
        let mut table_id = table_of(&self.load::<T>(id).await?);
        for _ in 0..RELOCK_ATTEMPTS {
            let guard = self.lock_table(table_id).await?;
            let entity: T = self.load(id).await?;
            let current = table_of(&entity);
            if current == table_id {
                return Ok((guard, entity));
            }
            tracing::debug!(kind = %T::KIND, id, from = table_id, to = current, "Moved while locking");
            table_id = current;
        }
        Err(CoordinatorError::Busy(LockTimeout {
            table_id,
            waited: self.locks.timeout(),
        }))
    }

    async fn lock_order(&self, order_id: i64) -> CoordinatorResult<(TableGuard, Order)> {
        self.lock_owner(order_id, |order: &Order| order.table_id).await
    }

    async fn lock_call(&self, call_id: i64) -> CoordinatorResult<(TableGuard, WaiterCall)> {
        self.lock_owner(call_id, |call: &WaiterCall| call.table_id).await
    }

    // ========================================================================
    // Loading
    // ========================================================================

    async fn load<T: Entity>(&self, id: i64) -> CoordinatorResult<T> {
        fetch::<T>(self.store.as_ref(), id)
            .await?
            .ok_or(CoordinatorError::NotFound { kind: T::KIND, id })
    }

    async fn load_table(&self, id: i64) -> CoordinatorResult<DiningTable> {
        self.load(id).await
    }

    async fn load_order(&self, id: i64) -> CoordinatorResult<Order> {
        self.load(id).await
    }

    async fn load_item(&self, id: i64) -> CoordinatorResult<OrderItem> {
        self.load(id).await
    }

    /// Items of `order` in submission order
    async fn order_items(&self, order: &Order) -> CoordinatorResult<Vec<OrderItem>> {
        let mut items: Vec<OrderItem> = find(
            self.store.as_ref(),
            &Filter::all().eq("order_id", order.id),
        )
        .await?;
        items.sort_by_key(|item| {
            order
                .item_ids
                .iter()
                .position(|id| *id == item.id)
                .unwrap_or(usize::MAX)
        });
        Ok(items)
    }

    /// Pending and attending calls raised at `table_id`
    async fn open_calls(&self, table_id: i64) -> CoordinatorResult<Vec<WaiterCall>> {
        let calls: Vec<WaiterCall> = find(
            self.store.as_ref(),
            &Filter::all().eq("table_id", table_id),
        )
        .await?;
        Ok(calls.into_iter().filter(|c| c.is_open()).collect())
    }

    // ========================================================================
    // Commit & publish
    // ========================================================================

    async fn commit(&self, batch: WriteBatch) -> CoordinatorResult<()> {
        let writes = batch.len();
        self.store.commit(batch).await.map_err(|e| {
            tracing::debug!(error = %e, writes, "Commit rejected");
            CoordinatorError::from(e)
        })
    }

    /// Commit the batch `build` makes for a newly created `entity`.
    ///
    /// A generated id that is already taken is replaced once with a fresh
    /// draw and the batch rebuilt.
    async fn commit_new<T: Entity>(
        &self,
        entity: &mut T,
        set_id: fn(&mut T, i64),
        build: impl Fn(&T) -> CoordinatorResult<WriteBatch>,
    ) -> CoordinatorResult<()> {
        let mut attempt = 1;
        loop {
            match self.store.commit(build(entity)?).await {
                Err(StoreError::AlreadyExists { kind, id })
                    if kind == T::KIND && id == entity.id() && attempt < ID_ATTEMPTS =>
                {
                    tracing::warn!(%kind, id, "Generated id already taken, drawing another");
                    set_id(entity, self.next_id());
                    attempt += 1;
                }
                result => return result.map_err(CoordinatorError::from),
            }
        }
    }

    fn publish(&self, payloads: impl IntoIterator<Item = EventPayload>) {
        for payload in payloads {
            self.events.publish(payload);
        }
    }
}

// ============================================================================
// Authorization helpers
// ============================================================================

/// Check the CPF presented by a customer against the order's customer
fn verify_customer(order: &Order, cpf: Option<&str>) -> CoordinatorResult<()> {
    let given = cpf.map(normalize_cpf).unwrap_or_default();
    match &order.customer {
        Some(customer) if !given.is_empty() && customer.cpf == given => Ok(()),
        _ => {
            crate::security_log!(
                "WARN",
                "cpf_mismatch",
                order_id = order.id,
                table_id = order.table_id
            );
            Err(CoordinatorError::CpfMismatch { order_id: order.id })
        }
    }
}

/// Who may add or remove lines on `order`.
///
/// Front-of-house may edit any order; customers only their own
/// self-service order.
fn authorize_order_edit(order: &Order, actor: &Actor, cpf: Option<&str>) -> CoordinatorResult<()> {
    match actor.role {
        role if role.is_front_of_house() => Ok(()),
        Role::Customer => {
            if order.order_type != OrderType::CustomerSelfService {
                return Err(CoordinatorError::forbidden(format!(
                    "order {} is managed by staff",
                    order.id
                )));
            }
            verify_customer(order, cpf)
        }
        role => Err(CoordinatorError::forbidden(format!(
            "{} may not edit orders",
            role
        ))),
    }
}

fn require_management(actor: &Actor, action: &str) -> CoordinatorResult<()> {
    if actor.role.is_management() {
        Ok(())
    } else {
        Err(CoordinatorError::forbidden(format!(
            "{} requires admin or manager, got {}",
            action, actor.role
        )))
    }
}

fn require_front_of_house(actor: &Actor, action: &str) -> CoordinatorResult<()> {
    if actor.role.is_front_of_house() {
        Ok(())
    } else {
        Err(CoordinatorError::forbidden(format!(
            "{} requires front-of-house staff, got {}",
            action, actor.role
        )))
    }
}

/// Fresh secret for a table's QR code
fn new_qr_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
