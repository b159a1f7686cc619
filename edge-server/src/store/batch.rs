use super::{Entity, EntityKind, StoreResult};
use serde_json::Value;

/// One write inside a batch
#[derive(Debug, Clone)]
pub enum Write {
    /// Insert a new document; fails if the id is taken
    Create {
        kind: EntityKind,
        id: i64,
        body: Value,
    },
    /// Merge `patch` into the document; fails if its version moved
    Update {
        kind: EntityKind,
        id: i64,
        expected_version: u64,
        patch: Value,
    },
    /// Remove the document; fails if its version moved
    Delete {
        kind: EntityKind,
        id: i64,
        expected_version: u64,
    },
}

impl Write {
    pub fn kind(&self) -> EntityKind {
        match self {
            Write::Create { kind, .. } | Write::Update { kind, .. } | Write::Delete { kind, .. } => {
                *kind
            }
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Write::Create { id, .. } | Write::Update { id, .. } | Write::Delete { id, .. } => *id,
        }
    }
}

/// Ordered set of writes committed atomically
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, write: Write) -> Self {
        self.writes.push(write);
        self
    }

    /// Create a new entity
    pub fn insert<T: Entity>(&mut self, entity: &T) -> StoreResult<()> {
        self.writes.push(Write::Create {
            kind: T::KIND,
            id: entity.id(),
            body: serde_json::to_value(entity)?,
        });
        Ok(())
    }

    /// Replace an entity previously read at `entity.version()`
    pub fn save<T: Entity>(&mut self, entity: &T) -> StoreResult<()> {
        self.writes.push(Write::Update {
            kind: T::KIND,
            id: entity.id(),
            expected_version: entity.version(),
            patch: serde_json::to_value(entity)?,
        });
        Ok(())
    }

    /// Remove an entity previously read at `entity.version()`
    pub fn remove<T: Entity>(&mut self, entity: &T) {
        self.writes.push(Write::Delete {
            kind: T::KIND,
            id: entity.id(),
            expected_version: entity.version(),
        });
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}
