//! Query engine for Tessera
//!
//! This crate provides:
//! - `Database`: the handle owning a storage backend, entity definitions
//!   and relations
//! - `EntitySchema` / `Entity`: schema-validated entity definitions
//! - `RelationsBuilder`: `one`/`many` relation declarations
//! - `Query`: filters, ordering, relation loading and `first()`
//! - the save pipeline, snapshot persistence and `OpenOptions`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare;
pub mod config;
pub mod database;
pub mod entity;
pub mod persist;
pub mod query;
pub mod relation;
pub mod resolve;
pub mod save;

pub use compare::{compare, sort_records, values_equal, Criterion, Direction, Op, OrderBy};
pub use config::{AccessMode, OpenOptions, WriteMode};
pub use database::Database;
pub use entity::{Entity, EntitySchema, FieldDescriptor, DEFAULT_ID_FIELD};
pub use query::{FindOptions, Query, QueryOutput};
pub use relation::{Reference, Relation, RelationKind, RelationRegistry, RelationsBuilder};
pub use resolve::{WithEntry, WithSpec};
