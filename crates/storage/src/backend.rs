//! Storage backend capability contract.
//!
//! The engine talks to storage only through [`StorageBackend`]: a mapping
//! from entity name to a table of id → record. Backends decide how (and
//! whether) data outlives the process.

use std::collections::BTreeMap;

use tessera_core::{EntityId, Record, TesseraResult};

/// One entity table: id → record, in table order.
pub type Table = BTreeMap<EntityId, Record>;

/// The full data set: entity name → table.
pub type TableData = BTreeMap<String, Table>;

/// Capability every storage collaborator implements.
///
/// All operations are synchronous. `get_all` must return a consistent
/// point-in-time view of one table; nothing is promised across tables or
/// across calls.
pub trait StorageBackend: Send + Sync {
    /// Create, or reset to empty, the table for `entity`.
    fn register_entity(&self, entity: &str);

    /// All records of `entity`, in table order.
    fn get_all(&self, entity: &str) -> TesseraResult<Vec<Record>>;

    /// One record by id.
    fn get_entity(&self, entity: &str, id: &EntityId) -> TesseraResult<Option<Record>>;

    /// Insert or overwrite the record stored under `id`.
    fn set_entity(&self, entity: &str, id: EntityId, record: Record) -> TesseraResult<()>;

    /// Patch a single field of an existing record.
    fn set_entity_key(
        &self,
        entity: &str,
        id: &EntityId,
        field: &str,
        value: serde_json::Value,
    ) -> TesseraResult<()>;

    /// Remove one record, returning it if it existed.
    fn remove_entity(&self, entity: &str, id: &EntityId) -> TesseraResult<Option<Record>>;

    /// Replace every table with `data`.
    fn set_data(&self, data: TableData);

    /// Copy of every table.
    fn get_data(&self) -> TableData;

    /// Names of the registered entities.
    fn entity_names(&self) -> Vec<String>;
}
