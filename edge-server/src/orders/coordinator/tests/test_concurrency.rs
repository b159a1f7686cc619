use super::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_preparing_has_one_winner() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let item_id = add(&h, order.id, FEIJOADA, 1).await.id;
    h.events.take();

    let kitchen_side = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .change_item_status(item_id, ItemStatus::Preparing, &kitchen())
                .await
        })
    };
    let waiter_side = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .change_item_status(item_id, ItemStatus::Preparing, &waiter(7))
                .await
        })
    };
    let results = [kitchen_side.await.unwrap(), waiter_side.await.unwrap()];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser.kind(), ErrorKind::Conflict);

    let events = h.events.take();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        EventPayload::ItemStatusChanged {
            status: ItemStatus::Preparing,
            ..
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_opens_create_one_order() {
    let h = create_test_coordinator().await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .open_table(
                        TABLE_5,
                        OpenTable {
                            occupants: 2,
                            ..Default::default()
                        },
                        &waiter(100 + i),
                    )
                    .await
            })
        })
        .collect();

    let mut opened = Vec::new();
    for handle in handles {
        if let Ok(order) = handle.await.unwrap() {
            opened.push(order);
        }
    }
    assert_eq!(opened.len(), 1);

    let table = h.coordinator.get_table(TABLE_5).await.unwrap();
    assert_eq!(table.current_order_id, Some(opened[0].id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_keep_total_consistent() {
    let h = create_test_coordinator().await;
    let order_id = open_staff_table(&h, TABLE_5).await.id;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .add_item(order_id, staff_item(CAIPIRINHA, 1), &waiter(7))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let detail = h.coordinator.get_order(order_id).await.unwrap();
    assert_eq!(detail.items.len(), 10);
    assert_eq!(detail.order.item_ids.len(), 10);
    assert_eq!(detail.order.total, Decimal::new(8500, 2));
}

#[tokio::test]
async fn test_held_lock_reports_busy() {
    let h = create_test_coordinator_with_timeout(Duration::from_millis(30)).await;
    let _held = h.coordinator.locks.acquire(TABLE_5).await.unwrap();

    let err = h
        .coordinator
        .open_table(
            TABLE_5,
            OpenTable {
                occupants: 2,
                ..Default::default()
            },
            &waiter(7),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Busy);

    // other tables are unaffected
    open_staff_table(&h, TABLE_8).await;
}

#[tokio::test]
async fn test_table_events_follow_commit_order() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let food = add(&h, order.id, FEIJOADA, 1).await;
    make_ready(&h, food.id).await;

    let statuses: Vec<ItemStatus> = h
        .events
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EventPayload::ItemStatusChanged { status, .. } => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, vec![ItemStatus::Preparing, ItemStatus::Ready]);
}

#[tokio::test]
async fn test_unknown_tables_leave_no_lock_slots() {
    let h = create_test_coordinator().await;
    for table_id in 1_000..1_200 {
        let err = h
            .coordinator
            .open_table(
                table_id,
                OpenTable {
                    occupants: 2,
                    ..Default::default()
                },
                &waiter(7),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    assert!(h.coordinator.locks.is_empty());

    let order = open_staff_table(&h, TABLE_5).await;
    add(&h, order.id, FEIJOADA, 1).await;
    h.coordinator
        .transfer_table(TABLE_5, TABLE_8, &waiter(7))
        .await
        .unwrap();
    assert!(h.coordinator.locks.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_keep_numbers_unique() {
    let h = create_test_coordinator().await;
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .create_table(
                        DiningTableCreate {
                            id: Some(30 + i),
                            number: "VIP 1".to_string(),
                            section: TableSection::Vip,
                        },
                        &admin(),
                    )
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(matches!(e, CoordinatorError::TableNumberTaken(_))),
        }
    }
    assert_eq!(created, 1);

    let tables = h.coordinator.list_tables(None).await.unwrap();
    assert_eq!(tables.iter().filter(|t| t.number == "VIP 1").count(), 1);
}

#[tokio::test]
async fn test_taken_generated_id_is_redrawn() {
    let h = create_test_coordinator().await;
    let order = open_staff_table(&h, TABLE_5).await;
    let first = add(&h, order.id, FEIJOADA, 1).await;

    // hand out the existing item's id first, then a free one
    let script = Arc::new(Mutex::new(vec![first.id + 1, first.id]));
    let ids: IdSource = {
        let script = script.clone();
        Arc::new(move || {
            script
                .lock()
                .pop()
                .unwrap_or_else(shared::util::snowflake_id)
        })
    };
    let coordinator = LifecycleCoordinator::new(
        h.coordinator.store().clone(),
        h.events.clone(),
        Duration::from_secs(2),
    )
    .with_id_source(ids);

    let second = coordinator
        .add_item(order.id, staff_item(CAIPIRINHA, 1), &waiter(7))
        .await
        .unwrap();
    assert_eq!(second.id, first.id + 1);
    assert!(script.lock().is_empty());

    let detail = coordinator.get_order(order.id).await.unwrap();
    assert_eq!(detail.order.item_ids, vec![first.id, second.id]);
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.items[0].product_id, FEIJOADA);
}
