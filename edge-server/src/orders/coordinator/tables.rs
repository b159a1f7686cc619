//! Table actions: open, request close, close, transfer, assign waiter,
//! plus table administration.

use super::{
    CoordinatorError, CoordinatorResult, LifecycleCoordinator, OpenTable, new_qr_token,
    require_management,
};
use crate::orders::locks::LockTimeout;
use crate::orders::machine::{OrderAction, TableAction, order_transition, table_transition};
use crate::orders::money::order_total;
use crate::store::{Filter, WriteBatch, find};
use shared::message::EventPayload;
use shared::models::{
    Actor, CallStatus, CustomerInfo, DiningTable, DiningTableCreate, ItemStatus, Order, OrderStatus,
    OrderType, PaymentMethod, Role, TableStatus,
};
use shared::util::{is_valid_cpf, normalize_cpf, now_millis};

/// Validate and normalize the customer identity attached to a new order
fn normalize_customer(customer: CustomerInfo) -> CoordinatorResult<CustomerInfo> {
    let name = customer.name.trim().to_string();
    if name.is_empty() {
        return Err(CoordinatorError::validation("customer name is required"));
    }
    if !is_valid_cpf(&customer.cpf) {
        return Err(CoordinatorError::validation("CPF must contain 11 digits"));
    }
    Ok(CustomerInfo {
        name,
        cpf: normalize_cpf(&customer.cpf),
        ..customer
    })
}

/// Return a table to `free`, clearing everything tied to the visit
fn release(table: &mut DiningTable) {
    table.status = TableStatus::Free;
    table.occupants = 0;
    table.open_time = None;
    table.current_order_id = None;
    table.waiter_id = None;
}

impl LifecycleCoordinator {
    /// Open a free table and create its order in one commit
    pub async fn open_table(
        &self,
        table_id: i64,
        input: OpenTable,
        actor: &Actor,
    ) -> CoordinatorResult<Order> {
        let _guard = self.lock_table(table_id).await?;
        let mut table = self.load_table(table_id).await?;

        let status = table_transition(
            table_id,
            table.status,
            TableAction::Open {
                occupants: input.occupants,
            },
            actor.role,
        )?;

        let (order_type, customer) = match (actor.role, input.customer) {
            (Role::Customer, Some(customer)) => (
                OrderType::CustomerSelfService,
                Some(normalize_customer(customer)?),
            ),
            (Role::Customer, None) => {
                return Err(CoordinatorError::validation(
                    "customer details are required for self-service",
                ));
            }
            (_, customer) => (OrderType::Waiter, customer.map(normalize_customer).transpose()?),
        };

        let waiter_id = input.waiter_id.or(table.waiter_id).or(match actor.role {
            Role::Waiter => actor.user_id,
            _ => None,
        });

        let now = now_millis();
        let mut order = Order {
            id: self.next_id(),
            table_id,
            waiter_id,
            customer,
            status: OrderStatus::Open,
            order_type,
            item_ids: Vec::new(),
            total: Default::default(),
            bill_requested: false,
            payment_method: None,
            opened_at: now,
            closed_at: None,
            version: 0,
        };

        table.status = status;
        table.occupants = input.occupants;
        table.waiter_id = waiter_id;
        table.open_time = Some(now);

        self.commit_new(
            &mut order,
            |order, id| order.id = id,
            |order| {
                let mut table = table.clone();
                table.current_order_id = Some(order.id);
                let mut batch = WriteBatch::new();
                batch.insert(order)?;
                batch.save(&table)?;
                Ok(batch)
            },
        )
        .await?;
        table.current_order_id = Some(order.id);

        tracing::info!(
            table_id,
            order_id = order.id,
            occupants = input.occupants,
            role = %actor.role,
            "Table opened"
        );
        self.publish([
            EventPayload::TableUpdate {
                table_id,
                status: table.status,
            },
            EventPayload::OrderStatusChanged {
                order_id: order.id,
                table_id,
                status: order.status,
            },
        ]);

        Ok(Order {
            version: order.version + 1,
            ..order
        })
    }

    /// Customer entry point: open the table behind a QR token
    pub async fn open_table_by_qr(
        &self,
        qr_token: &str,
        occupants: u32,
        customer: CustomerInfo,
    ) -> CoordinatorResult<Order> {
        let table = self.resolve_qr_token(qr_token).await?;
        let actor = Actor::customer(customer.name.clone());
        self.open_table(
            table.id,
            OpenTable {
                occupants,
                waiter_id: None,
                customer: Some(customer),
            },
            &actor,
        )
        .await
    }

    /// Mark an occupied table as waiting for payment
    pub async fn request_close(&self, table_id: i64, actor: &Actor) -> CoordinatorResult<DiningTable> {
        let _guard = self.lock_table(table_id).await?;
        let mut table = self.load_table(table_id).await?;
        table.status = table_transition(table_id, table.status, TableAction::RequestClose, actor.role)?;

        let mut batch = WriteBatch::new();
        batch.save(&table)?;
        self.commit(batch).await?;
        table.version += 1;

        tracing::info!(table_id, "Table waiting for payment");
        self.publish([EventPayload::TableUpdate {
            table_id,
            status: table.status,
        }]);
        Ok(table)
    }

    /// Settle the table's order and free the table.
    ///
    /// Rejected while any item is still pending or preparing. Open waiter
    /// calls at the table are resolved in the same commit.
    pub async fn close_table(
        &self,
        table_id: i64,
        payment_method: Option<PaymentMethod>,
        actor: &Actor,
    ) -> CoordinatorResult<Order> {
        let _guard = self.lock_table(table_id).await?;
        let mut table = self.load_table(table_id).await?;

        let next = table_transition(
            table_id,
            table.status,
            TableAction::Close { payment_method },
            actor.role,
        )?;
        let order_id = table
            .current_order_id
            .ok_or(CoordinatorError::NoActiveOrder(table_id))?;
        let mut order = self.load_order(order_id).await?;
        order.status = order_transition(order_id, order.status, OrderAction::Close, actor.role)?;

        let items = self.order_items(&order).await?;
        let unresolved = items.iter().filter(|i| i.status.is_unresolved()).count();
        if unresolved > 0 {
            return Err(CoordinatorError::UnresolvedItems {
                table_id,
                count: unresolved,
            });
        }

        let now = now_millis();
        order.total = order_total(&items);
        order.payment_method = payment_method;
        order.closed_at = Some(now);

        table.status = next;
        release(&mut table);

        let mut calls = self.open_calls(table_id).await?;
        let mut batch = WriteBatch::new();
        batch.save(&order)?;
        batch.save(&table)?;
        for call in calls.iter_mut() {
            call.status = CallStatus::Resolved;
            call.resolved_at = Some(now);
            call.notes.get_or_insert_with(|| "table closed".to_string());
            batch.save(&*call)?;
        }
        self.commit(batch).await?;
        order.version += 1;

        tracing::info!(
            table_id,
            order_id,
            total = %order.total,
            payment_method = ?payment_method,
            resolved_calls = calls.len(),
            "Table closed"
        );
        let mut events = vec![
            EventPayload::OrderStatusChanged {
                order_id,
                table_id,
                status: order.status,
            },
            EventPayload::TableUpdate {
                table_id,
                status: table.status,
            },
        ];
        events.extend(calls.iter().map(|call| EventPayload::WaiterCallUpdated {
            call_id: call.id,
            table_id,
            status: call.status,
            waiter_id: call.waiter_id,
        }));
        self.publish(events);

        Ok(order)
    }

    /// Move an active visit to a free table.
    ///
    /// Both tables are locked (in id order) for the whole action.
    pub async fn transfer_table(
        &self,
        source_id: i64,
        dest_id: i64,
        actor: &Actor,
    ) -> CoordinatorResult<DiningTable> {
        if source_id == dest_id {
            return Err(CoordinatorError::validation(
                "source and destination must differ",
            ));
        }
        let _guards = self.locks.acquire_many(&[source_id, dest_id]).await?;

        let mut source = self.load_table(source_id).await?;
        let mut dest = self.load_table(dest_id).await?;
        let source_next =
            table_transition(source_id, source.status, TableAction::TransferOut, actor.role)?;
        let dest_next = table_transition(dest_id, dest.status, TableAction::TransferIn, actor.role)?;

        let order_id = source
            .current_order_id
            .ok_or(CoordinatorError::NoActiveOrder(source_id))?;
        let mut order = self.load_order(order_id).await?;
        if !order.is_open() {
            return Err(CoordinatorError::OrderNotOpen(order_id));
        }
        order.table_id = dest_id;

        // the destination starts occupied; a pending bill stays on the order
        dest.status = dest_next;
        dest.occupants = source.occupants;
        dest.waiter_id = source.waiter_id;
        dest.open_time = source.open_time;
        dest.current_order_id = Some(order_id);

        source.status = source_next;
        release(&mut source);

        let mut calls = self.open_calls(source_id).await?;
        let mut batch = WriteBatch::new();
        batch.save(&source)?;
        batch.save(&dest)?;
        batch.save(&order)?;
        for call in calls.iter_mut() {
            call.table_id = dest_id;
            batch.save(&*call)?;
        }
        self.commit(batch).await?;
        dest.version += 1;

        tracing::info!(source_id, dest_id, order_id, "Table transferred");
        let mut events = vec![
            EventPayload::TableUpdate {
                table_id: source_id,
                status: source.status,
            },
            EventPayload::TableUpdate {
                table_id: dest_id,
                status: dest.status,
            },
            EventPayload::OrderUpdate {
                order_id,
                status: order.status,
            },
        ];
        events.extend(calls.iter().map(|call| EventPayload::WaiterCallUpdated {
            call_id: call.id,
            table_id: dest_id,
            status: call.status,
            waiter_id: call.waiter_id,
        }));
        self.publish(events);

        Ok(dest)
    }

    /// Set or clear the table's waiter.
    ///
    /// A waiter may only claim an unassigned table for themselves;
    /// managers reassign freely. The open order follows the table.
    pub async fn assign_waiter(
        &self,
        table_id: i64,
        waiter_id: Option<i64>,
        actor: &Actor,
    ) -> CoordinatorResult<DiningTable> {
        let _guard = self.lock_table(table_id).await?;
        let mut table = self.load_table(table_id).await?;
        table_transition(table_id, table.status, TableAction::AssignWaiter, actor.role)?;

        if actor.role == Role::Waiter
            && (waiter_id.is_none() || waiter_id != actor.user_id || table.waiter_id.is_some())
        {
            return Err(CoordinatorError::forbidden(
                "waiters may only claim unassigned tables for themselves",
            ));
        }

        table.waiter_id = waiter_id;
        let mut batch = WriteBatch::new();
        batch.save(&table)?;

        let mut order = None;
        if let Some(order_id) = table.current_order_id {
            let mut current = self.load_order(order_id).await?;
            current.waiter_id = waiter_id;
            batch.save(&current)?;
            order = Some(current);
        }
        self.commit(batch).await?;
        table.version += 1;

        tracing::info!(table_id, waiter_id = ?waiter_id, "Waiter assigned");
        let mut events = vec![EventPayload::TableUpdate {
            table_id,
            status: table.status,
        }];
        if let Some(order) = order {
            events.push(EventPayload::OrderUpdate {
                order_id: order.id,
                status: order.status,
            });
        }
        self.publish(events);

        Ok(table)
    }

    /// Administrative override: cancel the open order, its unfinished
    /// lines and open calls, and free the table.
    pub async fn cancel_order(
        &self,
        order_id: i64,
        reason: Option<String>,
        actor: &Actor,
    ) -> CoordinatorResult<Order> {
        let (_guard, mut order) = self.lock_order(order_id).await?;
        order.status = order_transition(order_id, order.status, OrderAction::Cancel, actor.role)?;
        let table_id = order.table_id;
        let mut table = self.load_table(table_id).await?;

        let now = now_millis();
        let mut items = self.order_items(&order).await?;
        let mut batch = WriteBatch::new();
        let mut canceled = Vec::new();
        for item in items.iter_mut().filter(|i| !i.status.is_terminal()) {
            item.status = ItemStatus::Canceled;
            batch.save(&*item)?;
            canceled.push((item.id, item.product_type));
        }
        order.total = order_total(&items);
        order.closed_at = Some(now);
        batch.save(&order)?;

        if table.current_order_id == Some(order_id) {
            release(&mut table);
            batch.save(&table)?;
        }

        let mut calls = self.open_calls(table_id).await?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "order canceled".to_string());
        for call in calls.iter_mut() {
            call.status = CallStatus::Resolved;
            call.resolved_at = Some(now);
            call.notes = Some(reason.clone());
            batch.save(&*call)?;
        }
        self.commit(batch).await?;
        order.version += 1;

        crate::security_log!(
            "INFO",
            "order_canceled",
            order_id = order_id,
            table_id = table_id,
            operator = actor.user_id.unwrap_or_default(),
            reason = reason.as_str()
        );
        let mut events: Vec<EventPayload> = canceled
            .into_iter()
            .map(|(item_id, product_type)| EventPayload::ItemStatusChanged {
                item_id,
                order_id,
                table_id,
                status: ItemStatus::Canceled,
                product_type,
            })
            .collect();
        events.push(EventPayload::OrderStatusChanged {
            order_id,
            table_id,
            status: order.status,
        });
        events.push(EventPayload::TableUpdate {
            table_id,
            status: table.status,
        });
        events.extend(calls.iter().map(|call| EventPayload::WaiterCallUpdated {
            call_id: call.id,
            table_id,
            status: call.status,
            waiter_id: call.waiter_id,
        }));
        self.publish(events);

        Ok(order)
    }

    // ========================================================================
    // Administration
    // ========================================================================

    pub async fn create_table(
        &self,
        input: DiningTableCreate,
        actor: &Actor,
    ) -> CoordinatorResult<DiningTable> {
        require_management(actor, "create table")?;
        let number = input.number.trim().to_string();
        if number.is_empty() {
            return Err(CoordinatorError::validation("table number is required"));
        }

        let _admin = tokio::time::timeout(self.locks.timeout(), self.admin.lock())
            .await
            .map_err(|_| {
                CoordinatorError::Busy(LockTimeout {
                    table_id: input.id.unwrap_or_default(),
                    waited: self.locks.timeout(),
                })
            })?;
        let id = input.id.unwrap_or_else(|| self.next_id());
        let _guard = self.lock_table(id).await?;

        let same_number: Vec<DiningTable> = find(
            self.store.as_ref(),
            &Filter::all().eq("number", number.clone()),
        )
        .await?;
        if !same_number.is_empty() {
            return Err(CoordinatorError::TableNumberTaken(number));
        }

        let table = DiningTable {
            id,
            number,
            section: input.section,
            status: TableStatus::Free,
            occupants: 0,
            waiter_id: None,
            open_time: None,
            current_order_id: None,
            qr_token: new_qr_token(),
            version: 0,
        };
        let mut batch = WriteBatch::new();
        batch.insert(&table)?;
        self.commit(batch).await?;

        tracing::info!(table_id = id, number = %table.number, "Table created");
        self.publish([EventPayload::TableUpdate {
            table_id: id,
            status: table.status,
        }]);
        Ok(DiningTable { version: 1, ..table })
    }

    /// Invalidate the printed QR code and issue a new one
    pub async fn rotate_qr_token(&self, table_id: i64, actor: &Actor) -> CoordinatorResult<DiningTable> {
        require_management(actor, "rotate QR token")?;
        let _guard = self.lock_table(table_id).await?;
        let mut table = self.load_table(table_id).await?;
        table.qr_token = new_qr_token();

        let mut batch = WriteBatch::new();
        batch.save(&table)?;
        self.commit(batch).await?;
        table.version += 1;

        crate::security_log!("INFO", "qr_token_rotated", table_id = table_id);
        self.publish([EventPayload::TableUpdate {
            table_id,
            status: table.status,
        }]);
        Ok(table)
    }

    /// Table behind a QR token
    pub async fn resolve_qr_token(&self, qr_token: &str) -> CoordinatorResult<DiningTable> {
        let token = qr_token.trim();
        if token.is_empty() {
            return Err(CoordinatorError::UnknownQrToken);
        }
        let tables: Vec<DiningTable> = find(
            self.store.as_ref(),
            &Filter::all().eq("qr_token", token.to_string()),
        )
        .await?;
        tables
            .into_iter()
            .next()
            .ok_or(CoordinatorError::UnknownQrToken)
    }
}
