//! # Tessera
//!
//! An in-memory, schema-validated object store with a relational query
//! layer. Entities are defined from field validators, stored in id-keyed
//! tables, and queried with filters, ordering and eager-loaded relations.
//!
//! ```ignore
//! use tessera::prelude::*;
//! use serde_json::json;
//!
//! let db = Database::cache();
//! let user = db.define_entity(
//!     EntitySchema::new("user")
//!         .field("id", FieldSchema::number())
//!         .field("age", FieldSchema::number().optional()),
//! )?;
//! db.save(&user, [json!({"id": 1, "age": 10}), json!({"id": 2, "age": 25})])?;
//!
//! let adult = db
//!     .query(&user)
//!     .filter("age", Op::Gt, 15)
//!     .order_by(["age"], [Direction::Asc])
//!     .first()
//!     .get()?
//!     .into_first();
//! ```
//!
//! ## Crates
//!
//! - `tessera-core`: ids, records, validators, errors
//! - `tessera-storage`: the storage backend contract and `MemoryStore`
//! - `tessera-engine`: definitions, queries, saves, snapshots

#![warn(missing_docs)]

pub mod types;

pub use types::*;

/// Re-export of the engine crate for advanced use
pub use tessera_engine as engine;
/// Re-export of the storage crate for custom backends
pub use tessera_storage as storage;

/// Everything needed for typical use.
pub mod prelude {
    pub use crate::types::{
        Database, Direction, Entity, EntitySchema, FieldSchema, FindOptions, Op, OpenOptions,
        QueryOutput, Record, TesseraError, TesseraResult, WithSpec,
    };
}
