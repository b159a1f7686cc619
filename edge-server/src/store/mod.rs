//! Entity Store
//!
//! Transactional document store keyed by entity id. Every record carries a
//! `version` that the store owns: `create` sets it to 1, every `update`
//! bumps it, and both `update` and `delete` must name the version they read.
//! A stale version fails with [`StoreError::VersionMismatch`], distinct from
//! every other failure, so callers can map it to a conflict.
//!
//! ```text
//! Coordinator ──▶ WriteBatch { create | update(expected_version) | delete }
//!                       │
//!                       ▼ commit (all-or-nothing)
//!                 EntityStore ──▶ RedbEntityStore (one redb table per kind)
//! ```

mod batch;
mod entity;
mod redb_store;

pub use batch::{Write, WriteBatch};
pub use entity::{Entity, fetch, find};
pub use redb_store::RedbEntityStore;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Kind of stored entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Table,
    Order,
    OrderItem,
    WaiterCall,
    Product,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Table,
        EntityKind::Order,
        EntityKind::OrderItem,
        EntityKind::WaiterCall,
        EntityKind::Product,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::Order => "order",
            EntityKind::OrderItem => "order_item",
            EntityKind::WaiterCall => "waiter_call",
            EntityKind::Product => "product",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stored document with its version
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub version: u64,
    pub body: Value,
}

/// Equality filter over top-level document fields
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every record
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, body: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| body.get(field) == Some(expected))
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} {id} version mismatch: expected {expected}, found {actual}")]
    VersionMismatch {
        kind: EntityKind,
        id: i64,
        expected: u64,
        actual: u64,
    },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: i64 },

    #[error("{kind} {id} not found")]
    Missing { kind: EntityKind, id: i64 },

    #[error("{kind} {id}: patch must be a JSON object")]
    InvalidPatch { kind: EntityKind, id: i64 },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional entity store.
///
/// Only the lifecycle coordinator writes through this trait.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, kind: EntityKind, id: i64) -> StoreResult<Option<Record>>;

    async fn query(&self, kind: EntityKind, filter: &Filter) -> StoreResult<Vec<Record>>;

    /// Apply every write atomically; any failed check aborts the whole batch.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    async fn create(&self, kind: EntityKind, id: i64, fields: Value) -> StoreResult<()> {
        self.commit(WriteBatch::new().push(Write::Create {
            kind,
            id,
            body: fields,
        }))
        .await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: i64,
        expected_version: u64,
        patch: Value,
    ) -> StoreResult<()> {
        self.commit(WriteBatch::new().push(Write::Update {
            kind,
            id,
            expected_version,
            patch,
        }))
        .await
    }
}

/// Top-level merge: keys in `patch` replace keys in `base`.
pub(crate) fn merge_patch(base: &mut Value, patch: Value) -> bool {
    match (base.as_object_mut(), patch) {
        (Some(target), Value::Object(fields)) => {
            for (key, value) in fields {
                target.insert(key, value);
            }
            true
        }
        _ => false,
    }
}

/// Version stored inside a document body
pub(crate) fn body_version(body: &Value) -> u64 {
    body.get("version").and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches() {
        let body = json!({"order_id": 7, "status": "pending"});
        assert!(Filter::all().matches(&body));
        assert!(Filter::all().eq("order_id", 7).matches(&body));
        assert!(
            Filter::all()
                .eq("order_id", 7)
                .eq("status", "pending")
                .matches(&body)
        );
        assert!(!Filter::all().eq("order_id", 8).matches(&body));
        assert!(!Filter::all().eq("missing", 1).matches(&body));
    }

    #[test]
    fn test_merge_patch() {
        let mut base = json!({"a": 1, "b": 2});
        assert!(merge_patch(&mut base, json!({"b": 3, "c": 4})));
        assert_eq!(base, json!({"a": 1, "b": 3, "c": 4}));
        assert!(!merge_patch(&mut base, json!([1, 2])));
    }
}
