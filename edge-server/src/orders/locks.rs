//! Per-table async locks
//!
//! The table is the aggregate root: every action touching a table, its
//! order, the order's items or its waiter calls runs under that table's
//! lock. Acquisition is bounded so one stuck action cannot starve the rest.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("table {table_id} is busy (waited {waited:?})")]
pub struct LockTimeout {
    pub table_id: i64,
    pub waited: Duration,
}

type Slots = DashMap<i64, Arc<Mutex<()>>>;

/// Held for the duration of one coordinator action.
///
/// Dropping the guard releases the table and forgets its slot once nobody
/// else holds or waits on it, so the registry only tracks tables in use.
#[derive(Debug)]
pub struct TableGuard {
    table_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Arc<Slots>,
}

impl Drop for TableGuard {
    fn drop(&mut self) {
        // the guard owns a clone of the slot; release it before pruning
        drop(self.guard.take());
        prune(&self.slots, self.table_id);
    }
}

fn prune(slots: &Slots, table_id: i64) {
    slots.remove_if(&table_id, |_, slot| Arc::strong_count(slot) == 1);
}

/// A waiter's claim on a slot; pruned on timeout or when the acquiring
/// future is dropped mid-wait.
struct Waiting {
    table_id: i64,
    slot: Option<Arc<Mutex<()>>>,
    slots: Arc<Slots>,
}

impl Drop for Waiting {
    fn drop(&mut self) {
        drop(self.slot.take());
        prune(&self.slots, self.table_id);
    }
}

pub struct TableLocks {
    slots: Arc<Slots>,
    timeout: Duration,
}

impl TableLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Tables currently locked or waited on
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, table_id: i64) -> Arc<Mutex<()>> {
        self.slots.entry(table_id).or_default().clone()
    }

    pub async fn acquire(&self, table_id: i64) -> Result<TableGuard, LockTimeout> {
        let lock = self.slot(table_id);
        let _waiting = Waiting {
            table_id,
            slot: Some(lock.clone()),
            slots: self.slots.clone(),
        };
        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(TableGuard {
                table_id,
                guard: Some(guard),
                slots: self.slots.clone(),
            }),
            Err(_) => Err(LockTimeout {
                table_id,
                waited: self.timeout,
            }),
        }
    }

    /// Lock several tables in ascending id order so that two transfers in
    /// opposite directions cannot deadlock.
    pub async fn acquire_many(&self, table_ids: &[i64]) -> Result<Vec<TableGuard>, LockTimeout> {
        let mut ids = table_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.acquire(id).await?);
        }
        Ok(guards)
    }
}
