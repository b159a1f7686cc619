//! redb-backed entity store
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `tables` | table id | JSON `DiningTable` |
//! | `orders` | order id | JSON `Order` |
//! | `order_items` | item id | JSON `OrderItem` |
//! | `waiter_calls` | call id | JSON `WaiterCall` |
//! | `products` | product id | JSON `Product` |
//!
//! The `version` field lives inside each JSON document and is written only
//! here. A batch is checked and applied inside a single write transaction;
//! returning early drops the transaction uncommitted, which aborts it.

use super::{
    EntityKind, EntityStore, Filter, Record, StoreError, StoreResult, Write, WriteBatch,
    body_version, merge_patch,
};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

const TABLES: TableDefinition<i64, &[u8]> = TableDefinition::new("tables");
const ORDERS: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");
const ORDER_ITEMS: TableDefinition<i64, &[u8]> = TableDefinition::new("order_items");
const WAITER_CALLS: TableDefinition<i64, &[u8]> = TableDefinition::new("waiter_calls");
const PRODUCTS: TableDefinition<i64, &[u8]> = TableDefinition::new("products");

fn definition(kind: EntityKind) -> TableDefinition<'static, i64, &'static [u8]> {
    match kind {
        EntityKind::Table => TABLES,
        EntityKind::Order => ORDERS,
        EntityKind::OrderItem => ORDER_ITEMS,
        EntityKind::WaiterCall => WAITER_CALLS,
        EntityKind::Product => PRODUCTS,
    }
}

fn set_version(body: &mut Value, version: u64) {
    if let Some(fields) = body.as_object_mut() {
        fields.insert("version".to_string(), Value::from(version));
    }
}

/// Entity store backed by redb
#[derive(Clone)]
pub struct RedbEntityStore {
    db: Arc<Database>,
}

impl RedbEntityStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        for kind in EntityKind::ALL {
            let _ = write_txn.open_table(definition(kind))?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    fn read_one(&self, kind: EntityKind, id: i64) -> StoreResult<Option<Record>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(definition(kind))?;
        let Some(guard) = table.get(id)? else {
            return Ok(None);
        };
        let body: Value = serde_json::from_slice(guard.value())?;
        Ok(Some(Record {
            id,
            version: body_version(&body),
            body,
        }))
    }

    fn read_matching(&self, kind: EntityKind, filter: &Filter) -> StoreResult<Vec<Record>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(definition(kind))?;
        let mut records = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let body: Value = serde_json::from_slice(value.value())?;
            if filter.matches(&body) {
                records.push(Record {
                    id: key.value(),
                    version: body_version(&body),
                    body,
                });
            }
        }
        Ok(records)
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        for write in batch.into_writes() {
            let kind = write.kind();
            let mut table = write_txn.open_table(definition(kind))?;
            match write {
                Write::Create { id, mut body, .. } => {
                    if table.get(id)?.is_some() {
                        return Err(StoreError::AlreadyExists { kind, id });
                    }
                    set_version(&mut body, 1);
                    table.insert(id, serde_json::to_vec(&body)?.as_slice())?;
                }
                Write::Update {
                    id,
                    expected_version,
                    patch,
                    ..
                } => {
                    let current = table.get(id)?.map(|guard| guard.value().to_vec());
                    let Some(bytes) = current else {
                        return Err(StoreError::Missing { kind, id });
                    };
                    let mut body: Value = serde_json::from_slice(&bytes)?;
                    let actual = body_version(&body);
                    if actual != expected_version {
                        return Err(StoreError::VersionMismatch {
                            kind,
                            id,
                            expected: expected_version,
                            actual,
                        });
                    }
                    if !merge_patch(&mut body, patch) {
                        return Err(StoreError::InvalidPatch { kind, id });
                    }
                    set_version(&mut body, actual + 1);
                    table.insert(id, serde_json::to_vec(&body)?.as_slice())?;
                }
                Write::Delete {
                    id,
                    expected_version,
                    ..
                } => {
                    let current = table.get(id)?.map(|guard| guard.value().to_vec());
                    let Some(bytes) = current else {
                        return Err(StoreError::Missing { kind, id });
                    };
                    let actual = body_version(&serde_json::from_slice(&bytes)?);
                    if actual != expected_version {
                        return Err(StoreError::VersionMismatch {
                            kind,
                            id,
                            expected: expected_version,
                            actual,
                        });
                    }
                    table.remove(id)?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for RedbEntityStore {
    async fn get(&self, kind: EntityKind, id: i64) -> StoreResult<Option<Record>> {
        self.read_one(kind, id)
    }

    async fn query(&self, kind: EntityKind, filter: &Filter) -> StoreResult<Vec<Record>> {
        self.read_matching(kind, filter)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.apply(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_store() -> RedbEntityStore {
        RedbEntityStore::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn test_create_sets_version_one() {
        let store = create_test_store();
        store
            .create(EntityKind::Table, 5, json!({"id": 5, "number": "5"}))
            .await
            .unwrap();

        let record = store.get(EntityKind::Table, 5).await.unwrap().unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.body["number"], "5");
        assert_eq!(record.body["version"], 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let store = create_test_store();
        store.create(EntityKind::Table, 5, json!({"id": 5})).await.unwrap();
        let err = store
            .create(EntityKind::Table, 5, json!({"id": 5}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { id: 5, .. }));
    }

    #[tokio::test]
    async fn test_update_checks_expected_version() {
        let store = create_test_store();
        store
            .create(EntityKind::Order, 1, json!({"id": 1, "status": "open"}))
            .await
            .unwrap();

        store
            .update(EntityKind::Order, 1, 1, json!({"status": "closed"}))
            .await
            .unwrap();
        let record = store.get(EntityKind::Order, 1).await.unwrap().unwrap();
        assert_eq!(record.version, 2);
        assert_eq!(record.body["status"], "closed");
        assert_eq!(record.body["id"], 1);

        // second writer still holding version 1
        let err = store
            .update(EntityKind::Order, 1, 1, json!({"status": "canceled"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        let record = store.get(EntityKind::Order, 1).await.unwrap().unwrap();
        assert_eq!(record.body["status"], "closed");
    }

    #[tokio::test]
    async fn test_failed_batch_is_not_partially_applied() {
        let store = create_test_store();
        store.create(EntityKind::Table, 1, json!({"id": 1})).await.unwrap();

        let batch = WriteBatch::new()
            .push(Write::Create {
                kind: EntityKind::Order,
                id: 10,
                body: json!({"id": 10}),
            })
            .push(Write::Update {
                kind: EntityKind::Table,
                id: 1,
                expected_version: 7,
                patch: json!({"status": "occupied"}),
            });
        assert!(store.commit(batch).await.is_err());

        assert!(store.get(EntityKind::Order, 10).await.unwrap().is_none());
        let table = store.get(EntityKind::Table, 1).await.unwrap().unwrap();
        assert_eq!(table.version, 1);
        assert!(table.body.get("status").is_none());
    }

    #[tokio::test]
    async fn test_delete_and_query() {
        let store = create_test_store();
        for id in 1..=3 {
            let order_id = if id < 3 { 100 } else { 200 };
            store
                .create(EntityKind::OrderItem, id, json!({"id": id, "order_id": order_id}))
                .await
                .unwrap();
        }

        let items = store
            .query(EntityKind::OrderItem, &Filter::all().eq("order_id", 100))
            .await
            .unwrap();
        assert_eq!(items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

        let err = store
            .commit(WriteBatch::new().push(Write::Delete {
                kind: EntityKind::OrderItem,
                id: 1,
                expected_version: 9,
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionMismatch { .. }));

        store
            .commit(WriteBatch::new().push(Write::Delete {
                kind: EntityKind::OrderItem,
                id: 1,
                expected_version: 1,
            }))
            .await
            .unwrap();
        assert!(store.get(EntityKind::OrderItem, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = create_test_store();
        let err = store
            .update(EntityKind::WaiterCall, 99, 1, json!({"status": "resolved"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing { id: 99, .. }));
    }

    #[tokio::test]
    async fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coordinator.redb");
        {
            let store = RedbEntityStore::open(&path).unwrap();
            store.create(EntityKind::Product, 1, json!({"id": 1})).await.unwrap();
        }
        let store = RedbEntityStore::open(&path).unwrap();
        assert!(store.get(EntityKind::Product, 1).await.unwrap().is_some());
    }
}
