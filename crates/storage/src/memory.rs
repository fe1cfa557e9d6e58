//! Sharded in-memory storage backend
//!
//! One shard per entity table, held in a DashMap keyed by entity name.
//!
//! # Design
//!
//! - DashMap: sharded by entity name, reads of one table never block
//!   writes to another
//! - BTreeMap within a shard: table order is ascending id order, so
//!   full scans are deterministic
//! - Observers are notified after the shard guard is released, so an
//!   observer may read the store from its callback

use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tessera_core::{EntityId, Record, TesseraError, TesseraResult};

use crate::backend::{StorageBackend, Table, TableData};
use crate::observer::{Observers, StoreEvent, StoreObserver, SubscriptionId};

/// One entity table.
#[derive(Debug, Default)]
pub struct Shard {
    /// id → record, ordered by id
    pub(crate) data: BTreeMap<EntityId, Record>,
}

impl Shard {
    /// Create a new empty shard
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Create a shard holding `table`
    pub fn from_table(table: Table) -> Self {
        Self { data: table }
    }

    /// Get number of records in this shard
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if shard is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// In-process storage backend.
///
/// # Thread Safety
///
/// All operations are thread-safe, but the engine assumes a single
/// logical writer. Every mutation bumps [`MemoryStore::version`] and then
/// notifies subscribed observers.
///
/// # Example
///
/// ```ignore
/// use tessera_storage::{MemoryStore, StorageBackend};
///
/// let store = MemoryStore::new();
/// store.register_entity("user");
/// let rows = store.get_all("user")?;
/// ```
pub struct MemoryStore {
    /// Per-entity shards
    shards: DashMap<String, Shard>,
    /// Mutation counter
    version: AtomicU64,
    /// Change subscribers
    observers: Observers,
}

impl MemoryStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self {
            shards: DashMap::new(),
            version: AtomicU64::new(0),
            observers: Observers::new(),
        }
    }

    /// Create with expected number of entities
    pub fn with_capacity(num_entities: usize) -> Self {
        Self {
            shards: DashMap::with_capacity(num_entities),
            version: AtomicU64::new(0),
            observers: Observers::new(),
        }
    }

    /// Number of mutations applied so far
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Get number of tables
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Get total number of records across all tables
    pub fn total_entries(&self) -> usize {
        self.shards.iter().map(|entry| entry.value().len()).sum()
    }

    /// Get count of records for one entity (0 if unregistered)
    pub fn entry_count(&self, entity: &str) -> usize {
        self.shards.get(entity).map(|shard| shard.len()).unwrap_or(0)
    }

    /// Subscribe to change events.
    pub fn subscribe(&self, observer: Arc<dyn StoreObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn changed(&self, event: StoreEvent) {
        self.version.fetch_add(1, Ordering::AcqRel);
        self.observers.notify(&event);
    }
}

impl StorageBackend for MemoryStore {
    fn register_entity(&self, entity: &str) {
        self.shards.insert(entity.to_string(), Shard::new());
        tracing::trace!(entity, "table registered");
        self.changed(StoreEvent::Registered {
            entity: entity.to_string(),
        });
    }

    fn get_all(&self, entity: &str) -> TesseraResult<Vec<Record>> {
        self.shards
            .get(entity)
            .map(|shard| shard.data.values().cloned().collect())
            .ok_or_else(|| TesseraError::not_registered(entity))
    }

    fn get_entity(&self, entity: &str, id: &EntityId) -> TesseraResult<Option<Record>> {
        self.shards
            .get(entity)
            .map(|shard| shard.data.get(id).cloned())
            .ok_or_else(|| TesseraError::not_registered(entity))
    }

    fn set_entity(&self, entity: &str, id: EntityId, record: Record) -> TesseraResult<()> {
        {
            let mut shard = self
                .shards
                .get_mut(entity)
                .ok_or_else(|| TesseraError::not_registered(entity))?;
            shard.data.insert(id.clone(), record);
        }
        self.changed(StoreEvent::Upserted {
            entity: entity.to_string(),
            id,
        });
        Ok(())
    }

    fn set_entity_key(
        &self,
        entity: &str,
        id: &EntityId,
        field: &str,
        value: Value,
    ) -> TesseraResult<()> {
        {
            let mut shard = self
                .shards
                .get_mut(entity)
                .ok_or_else(|| TesseraError::not_registered(entity))?;
            let record = shard
                .data
                .get_mut(id)
                .ok_or_else(|| TesseraError::record_not_found(entity, id))?;
            record.insert(field.to_string(), value);
        }
        self.changed(StoreEvent::Patched {
            entity: entity.to_string(),
            id: id.clone(),
            field: field.to_string(),
        });
        Ok(())
    }

    fn remove_entity(&self, entity: &str, id: &EntityId) -> TesseraResult<Option<Record>> {
        let removed = self
            .shards
            .get_mut(entity)
            .ok_or_else(|| TesseraError::not_registered(entity))?
            .data
            .remove(id);
        if removed.is_some() {
            self.changed(StoreEvent::Removed {
                entity: entity.to_string(),
                id: id.clone(),
            });
        }
        Ok(removed)
    }

    fn set_data(&self, data: TableData) {
        self.shards.clear();
        for (entity, table) in data {
            self.shards.insert(entity, Shard::from_table(table));
        }
        self.changed(StoreEvent::Replaced);
    }

    fn get_data(&self) -> TableData {
        self.shards
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().data.clone()))
            .collect()
    }

    fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shards.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("shard_count", &self.shard_count())
            .field("version", &self.version())
            .field("total_entries", &self.total_entries())
            .finish()
    }
}
