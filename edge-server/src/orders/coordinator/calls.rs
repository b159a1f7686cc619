//! Customer requests: waiter calls and bill requests

use super::{
    CallWaiter, CoordinatorError, CoordinatorResult, LifecycleCoordinator, require_front_of_house,
    verify_customer,
};
use crate::store::WriteBatch;
use shared::message::EventPayload;
use shared::models::{Actor, CallReason, CallStatus, Order, Role, WaiterCall};
use shared::util::now_millis;

const MAX_REASON_LEN: usize = 200;

impl LifecycleCoordinator {
    /// Raise a waiter call from the customer app
    pub async fn call_waiter(
        &self,
        order_id: i64,
        input: CallWaiter,
    ) -> CoordinatorResult<WaiterCall> {
        let custom_reason = input
            .custom_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if input.reason == CallReason::Other && custom_reason.is_none() {
            return Err(CoordinatorError::validation(
                "a description is required when the reason is 'other'",
            ));
        }
        if custom_reason
            .as_ref()
            .is_some_and(|r| r.chars().count() > MAX_REASON_LEN)
        {
            return Err(CoordinatorError::validation(format!(
                "reason must be at most {} characters",
                MAX_REASON_LEN
            )));
        }

        let (_guard, order) = self.lock_order(order_id).await?;
        verify_customer(&order, Some(&input.customer_cpf))?;
        if !order.is_open() {
            return Err(CoordinatorError::OrderNotOpen(order_id));
        }
        let Some(customer) = order.customer.clone() else {
            return Err(CoordinatorError::CpfMismatch { order_id });
        };

        let mut call = WaiterCall {
            id: self.next_id(),
            table_id: order.table_id,
            order_id,
            customer,
            reason: input.reason,
            custom_reason,
            status: CallStatus::Pending,
            waiter_id: None,
            notes: None,
            created_at: now_millis(),
            attended_at: None,
            resolved_at: None,
            version: 0,
        };
        self.commit_new(
            &mut call,
            |call, id| call.id = id,
            |call| {
                let mut batch = WriteBatch::new();
                batch.insert(call)?;
                Ok(batch)
            },
        )
        .await?;

        tracing::info!(call_id = call.id, table_id = call.table_id, reason = ?call.reason, "Waiter called");
        self.publish([EventPayload::WaiterCalled {
            call_id: call.id,
            table_id: call.table_id,
            customer: call.customer.name.clone(),
            reason: call.reason,
        }]);

        Ok(WaiterCall {
            version: call.version + 1,
            ..call
        })
    }

    /// Claim a pending call. Attending a call at an unassigned table also
    /// assigns the table (and its order) to that waiter.
    pub async fn attend_call(
        &self,
        call_id: i64,
        waiter_id: i64,
        actor: &Actor,
    ) -> CoordinatorResult<WaiterCall> {
        require_front_of_house(actor, "attend waiter call")?;
        if actor.role == Role::Waiter && actor.user_id != Some(waiter_id) {
            return Err(CoordinatorError::forbidden(
                "waiters may only attend calls themselves",
            ));
        }

        let (_guard, mut call) = self.lock_call(call_id).await?;
        if call.status != CallStatus::Pending {
            return Err(CoordinatorError::CallTransition {
                call_id,
                from: call.status,
                to: CallStatus::Attending,
            });
        }

        call.status = CallStatus::Attending;
        call.waiter_id = Some(waiter_id);
        call.attended_at = Some(now_millis());

        let mut batch = WriteBatch::new();
        batch.save(&call)?;

        let mut claimed_table = None;
        let mut table = self.load_table(call.table_id).await?;
        if table.waiter_id.is_none() && !table.is_free() {
            table.waiter_id = Some(waiter_id);
            batch.save(&table)?;
            if let Some(order_id) = table.current_order_id {
                let mut order: Order = self.load_order(order_id).await?;
                order.waiter_id = Some(waiter_id);
                batch.save(&order)?;
            }
            claimed_table = Some(table);
        }
        self.commit(batch).await?;
        call.version += 1;

        tracing::info!(call_id, waiter_id, "Waiter call attended");
        let mut events = vec![EventPayload::WaiterCallUpdated {
            call_id,
            table_id: call.table_id,
            status: call.status,
            waiter_id: call.waiter_id,
        }];
        if let Some(table) = claimed_table {
            events.push(EventPayload::TableUpdate {
                table_id: table.id,
                status: table.status,
            });
        }
        self.publish(events);

        Ok(call)
    }

    /// Close out an attended call
    pub async fn resolve_call(
        &self,
        call_id: i64,
        notes: Option<String>,
        actor: &Actor,
    ) -> CoordinatorResult<WaiterCall> {
        require_front_of_house(actor, "resolve waiter call")?;

        let (_guard, mut call) = self.lock_call(call_id).await?;
        if call.status != CallStatus::Attending {
            return Err(CoordinatorError::CallTransition {
                call_id,
                from: call.status,
                to: CallStatus::Resolved,
            });
        }

        call.status = CallStatus::Resolved;
        call.resolved_at = Some(now_millis());
        call.notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let mut batch = WriteBatch::new();
        batch.save(&call)?;
        self.commit(batch).await?;
        call.version += 1;

        tracing::info!(call_id, "Waiter call resolved");
        self.publish([EventPayload::WaiterCallUpdated {
            call_id,
            table_id: call.table_id,
            status: call.status,
            waiter_id: call.waiter_id,
        }]);

        Ok(call)
    }

    /// Flag the order for billing. Advisory only: the table state does not
    /// change until staff close it.
    pub async fn request_bill(&self, order_id: i64, customer_cpf: &str) -> CoordinatorResult<Order> {
        let (_guard, mut order) = self.lock_order(order_id).await?;
        verify_customer(&order, Some(customer_cpf))?;
        if !order.is_open() {
            return Err(CoordinatorError::OrderNotOpen(order_id));
        }

        order.bill_requested = true;
        let mut batch = WriteBatch::new();
        batch.save(&order)?;
        self.commit(batch).await?;
        order.version += 1;

        let customer = order
            .customer
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        tracing::info!(order_id, table_id = order.table_id, "Bill requested");
        self.publish([
            EventPayload::BillRequested {
                table_id: order.table_id,
                order_id,
                customer,
            },
            EventPayload::OrderUpdate {
                order_id,
                status: order.status,
            },
        ]);

        Ok(order)
    }
}
