//! Public types for the Tessera API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// ============================================================================
// Values and identities
// ============================================================================

pub use serde_json::Value;
pub use tessera_core::{EntityId, IdKind, Record, ValueKind};

// ============================================================================
// Validation
// ============================================================================

pub use tessera_core::{FieldSchema, FnValidator, Validator};

// ============================================================================
// Errors
// ============================================================================

pub use tessera_core::{TesseraError, TesseraResult};

// ============================================================================
// Storage
// ============================================================================

pub use tessera_storage::{
    MemoryStore, StorageBackend, StoreEvent, StoreObserver, SubscriptionId, Table, TableData,
};

// ============================================================================
// Engine
// ============================================================================

pub use tessera_engine::{
    AccessMode, Criterion, Database, Direction, Entity, EntitySchema, FindOptions, Op,
    OpenOptions, Query, QueryOutput, Relation, RelationKind, RelationsBuilder, WithSpec,
    WriteMode,
};
