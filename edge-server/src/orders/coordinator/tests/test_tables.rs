use super::*;

// ========================================================================
// Open
// ========================================================================

#[tokio::test]
async fn test_open_table_creates_order() {
    let h = create_test_coordinator().await;

    let order = open_staff_table(&h, TABLE_5).await;
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.order_type, OrderType::Waiter);
    assert_eq!(order.table_id, TABLE_5);
    assert_eq!(order.waiter_id, Some(7));
    assert_eq!(order.total, Decimal::ZERO);
    assert_eq!(order.version, 1);

    let table = h.coordinator.get_table(TABLE_5).await.unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(table.current_order_id, Some(order.id));
    assert_eq!(table.occupants, 2);
    assert!(table.open_time.is_some());
    assert!(table.is_consistent());

    assert_eq!(h.events.names(), vec!["tableUpdate", "orderStatusChanged"]);
}

#[tokio::test]
async fn test_open_occupied_table_conflicts() {
    let h = create_test_coordinator().await;
    open_staff_table(&h, TABLE_5).await;
    h.events.take();

    let err = h
        .coordinator
        .open_table(
            TABLE_5,
            OpenTable {
                occupants: 4,
                ..Default::default()
            },
            &waiter(9),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(h.events.take().is_empty());
}

#[tokio::test]
async fn test_open_requires_occupants() {
    let h = create_test_coordinator().await;
    let err = h
        .coordinator
        .open_table(TABLE_5, OpenTable::default(), &waiter(7))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let table = h.coordinator.get_table(TABLE_5).await.unwrap();
    assert!(table.is_free());
}

#[tokio::test]
async fn test_open_unknown_table() {
    let h = create_test_coordinator().await;
    let err = h
        .coordinator
        .open_table(999, OpenTable { occupants: 1, ..Default::default() }, &waiter(7))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_open_uses_assigned_waiter() {
    let h = create_test_coordinator().await;
    h.coordinator
        .assign_waiter(TABLE_5, Some(12), &manager())
        .await
        .unwrap();

    let order = h
        .coordinator
        .open_table(TABLE_5, OpenTable { occupants: 3, ..Default::default() }, &admin())
        .await
        .unwrap();
    assert_eq!(order.waiter_id, Some(12));
}

#[tokio::test]
async fn test_customer_opens_through_qr() {
    let h = create_test_coordinator().await;

    let order = open_customer_table(&h, TABLE_5).await;
    assert_eq!(order.order_type, OrderType::CustomerSelfService);
    let customer = order.customer.unwrap();
    assert_eq!(customer.cpf, "12345678909");
    assert_eq!(customer.name, "Ana");
    assert_eq!(order.waiter_id, None);
}

#[tokio::test]
async fn test_customer_open_rejects_bad_cpf() {
    let h = create_test_coordinator().await;
    let table = h.coordinator.get_table(TABLE_5).await.unwrap();

    let err = h
        .coordinator
        .open_table_by_qr(
            &table.qr_token,
            2,
            CustomerInfo {
                cpf: "123".into(),
                ..ana()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_unknown_qr_token() {
    let h = create_test_coordinator().await;
    let err = h
        .coordinator
        .open_table_by_qr("not-a-token", 2, ana())
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::UnknownQrToken));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ========================================================================
// Close
// ========================================================================

#[tokio::test]
async fn test_full_visit_lifecycle() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let food = add(&h, order.id, FEIJOADA, 2).await;
    let drink = add(&h, order.id, CAIPIRINHA, 1).await;

    make_ready(&h, food.id).await;
    make_ready(&h, drink.id).await;
    for item in [food.id, drink.id] {
        h.coordinator
            .change_item_status(item, ItemStatus::Delivered, &waiter(7))
            .await
            .unwrap();
    }
    h.events.take();

    let closed = h
        .coordinator
        .close_table(TABLE_5, Some(PaymentMethod::Pix), &waiter(7))
        .await
        .unwrap();
    assert_eq!(closed.status, OrderStatus::Closed);
    assert_eq!(closed.payment_method, Some(PaymentMethod::Pix));
    assert_eq!(closed.total, Decimal::new(8850, 2));
    assert!(closed.closed_at.is_some());

    let table = h.coordinator.get_table(TABLE_5).await.unwrap();
    assert_eq!(table.status, TableStatus::Free);
    assert_eq!(table.current_order_id, None);
    assert_eq!(table.open_time, None);
    assert_eq!(table.waiter_id, None);
    assert_eq!(table.occupants, 0);
    assert!(table.is_consistent());

    assert_eq!(h.events.names(), vec!["orderStatusChanged", "tableUpdate"]);
}

#[tokio::test]
async fn test_close_blocked_by_unresolved_items() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let food = add(&h, order.id, FEIJOADA, 1).await;
    h.events.take();

    let err = h
        .coordinator
        .close_table(TABLE_5, Some(PaymentMethod::Cash), &waiter(7))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::UnresolvedItems { table_id: TABLE_5, count: 1 }
    ));
    assert!(h.events.take().is_empty());

    // a ready item no longer blocks
    make_ready(&h, food.id).await;
    h.coordinator
        .close_table(TABLE_5, Some(PaymentMethod::Cash), &waiter(7))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_canceled_items_do_not_block_close() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let food = add(&h, order.id, FEIJOADA, 1).await;
    h.coordinator
        .change_item_status(food.id, ItemStatus::Canceled, &waiter(7))
        .await
        .unwrap();

    let closed = h
        .coordinator
        .close_table(TABLE_5, Some(PaymentMethod::Debit), &waiter(7))
        .await
        .unwrap();
    assert_eq!(closed.total, Decimal::ZERO);
}

#[tokio::test]
async fn test_close_requires_payment_method() {
    let h = create_test_coordinator().await;
    open_staff_table(&h, TABLE_5).await;

    let err = h
        .coordinator
        .close_table(TABLE_5, None, &waiter(7))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_close_free_table_conflicts() {
    let h = create_test_coordinator().await;
    let err = h
        .coordinator
        .close_table(TABLE_5, Some(PaymentMethod::Cash), &waiter(7))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_role_checked_before_state() {
    let h = create_test_coordinator().await;

    // kitchen may never close, even a free table
    let err = h
        .coordinator
        .close_table(TABLE_5, Some(PaymentMethod::Cash), &kitchen())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_request_close_then_close() {
    let h = create_test_coordinator().await;
    open_staff_table(&h, TABLE_5).await;

    let table = h.coordinator.request_close(TABLE_5, &waiter(7)).await.unwrap();
    assert_eq!(table.status, TableStatus::WaitingPayment);

    let err = h
        .coordinator
        .request_close(TABLE_5, &waiter(7))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    h.coordinator
        .close_table(TABLE_5, Some(PaymentMethod::Credit), &waiter(7))
        .await
        .unwrap();
    assert!(h.coordinator.get_table(TABLE_5).await.unwrap().is_free());
}

#[tokio::test]
async fn test_customer_cannot_request_close() {
    let h = create_test_coordinator().await;
    open_customer_table(&h, TABLE_5).await;
    let err = h
        .coordinator
        .request_close(TABLE_5, &customer())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

// ========================================================================
// Transfer
// ========================================================================

#[tokio::test]
async fn test_transfer_moves_the_visit() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    add(&h, order.id, FEIJOADA, 1).await;
    let source_before = h.coordinator.get_table(TABLE_5).await.unwrap();
    h.events.take();

    let dest = h
        .coordinator
        .transfer_table(TABLE_5, TABLE_8, &waiter(7))
        .await
        .unwrap();
    assert_eq!(dest.status, TableStatus::Occupied);
    assert_eq!(dest.current_order_id, Some(order.id));
    assert_eq!(dest.open_time, source_before.open_time);
    assert_eq!(dest.occupants, source_before.occupants);
    assert_eq!(dest.waiter_id, Some(7));

    let source = h.coordinator.get_table(TABLE_5).await.unwrap();
    assert!(source.is_free());
    assert!(source.is_consistent());

    let detail = h.coordinator.get_order(order.id).await.unwrap();
    assert_eq!(detail.order.table_id, TABLE_8);
    assert_eq!(detail.items.len(), 1);

    assert_eq!(
        h.events.names(),
        vec!["tableUpdate", "tableUpdate", "orderUpdate"]
    );

    // the moved order is now driven through the new table
    h.coordinator
        .add_item(order.id, staff_item(CAIPIRINHA, 1), &waiter(7))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_transfer_to_occupied_table_conflicts() {
    let h = create_test_coordinator().await;
    open_staff_table(&h, TABLE_5).await;
    open_staff_table(&h, TABLE_8).await;

    let err = h
        .coordinator
        .transfer_table(TABLE_5, TABLE_8, &waiter(7))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_transfer_from_waiting_payment_lands_occupied() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let table = h.coordinator.request_close(TABLE_5, &waiter(7)).await.unwrap();
    assert_eq!(table.status, TableStatus::WaitingPayment);

    let dest = h
        .coordinator
        .transfer_table(TABLE_5, TABLE_8, &waiter(7))
        .await
        .unwrap();
    assert_eq!(dest.status, TableStatus::Occupied);
    assert_eq!(dest.current_order_id, Some(order.id));
    assert!(dest.is_consistent());
    assert!(h.coordinator.get_table(TABLE_5).await.unwrap().is_free());

    // the moved visit can still be asked to close and settled at the new table
    h.coordinator.request_close(TABLE_8, &waiter(7)).await.unwrap();
    let closed = h
        .coordinator
        .close_table(TABLE_8, Some(PaymentMethod::Cash), &waiter(7))
        .await
        .unwrap();
    assert_eq!(closed.status, OrderStatus::Closed);
}

#[tokio::test]
async fn test_transfer_requires_distinct_tables() {
    let h = create_test_coordinator().await;
    open_staff_table(&h, TABLE_5).await;
    let err = h
        .coordinator
        .transfer_table(TABLE_5, TABLE_5, &waiter(7))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_transfer_moves_open_calls() {
    let h = create_test_coordinator().await;
    let order = open_customer_table(&h, TABLE_5).await;
    let call = h
        .coordinator
        .call_waiter(
            order.id,
            CallWaiter {
                reason: CallReason::Assistance,
                custom_reason: None,
                customer_cpf: CPF.to_string(),
            },
        )
        .await
        .unwrap();

    h.coordinator
        .transfer_table(TABLE_5, TABLE_8, &manager())
        .await
        .unwrap();
    let calls = h.coordinator.list_open_calls().await.unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, call.id);
    assert_eq!(calls[0].table_id, TABLE_8);
}

// ========================================================================
// Waiter assignment
// ========================================================================

#[tokio::test]
async fn test_assign_waiter_follows_order() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;

    let table = h
        .coordinator
        .assign_waiter(TABLE_5, Some(9), &manager())
        .await
        .unwrap();
    assert_eq!(table.waiter_id, Some(9));

    let detail = h.coordinator.get_order(order.id).await.unwrap();
    assert_eq!(detail.order.waiter_id, Some(9));
}

#[tokio::test]
async fn test_waiter_can_only_claim_unassigned_table() {
    let h = create_test_coordinator().await;

    h.coordinator
        .assign_waiter(TABLE_5, Some(7), &waiter(7))
        .await
        .unwrap();

    let err = h
        .coordinator
        .assign_waiter(TABLE_5, Some(9), &waiter(9))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = h
        .coordinator
        .assign_waiter(TABLE_8, Some(7), &waiter(9))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

// ========================================================================
// Cancel
// ========================================================================

#[tokio::test]
async fn test_cancel_order_frees_table() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let food = add(&h, order.id, FEIJOADA, 1).await;
    let drink = add(&h, order.id, CAIPIRINHA, 2).await;
    make_ready(&h, drink.id).await;
    h.coordinator
        .change_item_status(drink.id, ItemStatus::Delivered, &waiter(7))
        .await
        .unwrap();
    h.events.take();

    let canceled = h
        .coordinator
        .cancel_order(order.id, Some("walked out".into()), &manager())
        .await
        .unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    // delivered lines stay on the bill
    assert_eq!(canceled.total, Decimal::new(1700, 2));

    let detail = h.coordinator.get_order(order.id).await.unwrap();
    let food_after = detail.items.iter().find(|i| i.id == food.id).unwrap();
    assert_eq!(food_after.status, ItemStatus::Canceled);

    assert!(h.coordinator.get_table(TABLE_5).await.unwrap().is_free());
    assert_eq!(
        h.events.names(),
        vec!["itemStatusChanged", "orderStatusChanged", "tableUpdate"]
    );
}

#[tokio::test]
async fn test_cancel_requires_management() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let err = h
        .coordinator
        .cancel_order(order.id, None, &waiter(7))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

// ========================================================================
// Administration
// ========================================================================

#[tokio::test]
async fn test_create_table_rejects_duplicate_number() {
    let h = create_test_coordinator().await;
    let err = h
        .coordinator
        .create_table(
            DiningTableCreate {
                id: None,
                number: "5".into(),
                section: TableSection::Deck,
            },
            &admin(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::TableNumberTaken(_)));
}

#[tokio::test]
async fn test_create_table_requires_management() {
    let h = create_test_coordinator().await;
    let err = h
        .coordinator
        .create_table(
            DiningTableCreate {
                id: None,
                number: "12".into(),
                section: TableSection::Beach,
            },
            &waiter(7),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_rotate_qr_token_invalidates_old_code() {
    let h = create_test_coordinator().await;
    let old = h.coordinator.get_table(TABLE_5).await.unwrap().qr_token;

    let table = h
        .coordinator
        .rotate_qr_token(TABLE_5, &manager())
        .await
        .unwrap();
    assert_ne!(table.qr_token, old);
    assert_eq!(table.qr_token.len(), 32);

    assert!(h.coordinator.resolve_qr_token(&old).await.is_err());
    assert_eq!(
        h.coordinator.resolve_qr_token(&table.qr_token).await.unwrap().id,
        TABLE_5
    );
}

#[tokio::test]
async fn test_list_tables_by_status() {
    let h = create_test_coordinator().await;
    open_staff_table(&h, TABLE_8).await;

    let all = h.coordinator.list_tables(None).await.unwrap();
    assert_eq!(all.len(), 2);
    let free = h
        .coordinator
        .list_tables(Some(TableStatus::Free))
        .await
        .unwrap();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].id, TABLE_5);
}
