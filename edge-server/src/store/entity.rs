use super::{EntityKind, EntityStore, Filter, Record, StoreResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{DiningTable, Order, OrderItem, Product, WaiterCall};

/// A typed document stored under [`EntityKind`]
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;

    fn id(&self) -> i64;

    /// Version the entity was read at (0 before first insert)
    fn version(&self) -> u64;
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> i64 {
                self.id
            }

            fn version(&self) -> u64 {
                self.version
            }
        }
    };
}

impl_entity!(DiningTable, EntityKind::Table);
impl_entity!(Order, EntityKind::Order);
impl_entity!(OrderItem, EntityKind::OrderItem);
impl_entity!(WaiterCall, EntityKind::WaiterCall);
impl_entity!(Product, EntityKind::Product);

fn decode<T: Entity>(record: Record) -> StoreResult<T> {
    Ok(serde_json::from_value(record.body)?)
}

/// Typed `get`
pub async fn fetch<T: Entity>(store: &dyn EntityStore, id: i64) -> StoreResult<Option<T>> {
    store.get(T::KIND, id).await?.map(decode).transpose()
}

/// Typed `query`, ordered by id
pub async fn find<T: Entity>(store: &dyn EntityStore, filter: &Filter) -> StoreResult<Vec<T>> {
    store
        .query(T::KIND, filter)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}
