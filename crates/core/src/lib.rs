//! Core types for Tessera
//!
//! This crate defines the vocabulary shared by the storage and engine
//! layers:
//! - `EntityId` / `IdKind`: record identities and their declared kind
//! - `Record`: the field-value map stored per row
//! - `Validator` / `FieldSchema`: the field validation capability
//! - `TesseraError`: the error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod schema;
pub mod types;
pub mod value;

pub use error::{TesseraError, TesseraResult, OR_WITHOUT_WHERE};
pub use schema::{FieldSchema, FnValidator, Validator};
pub use types::{EntityId, IdKind, Record};
pub use value::{is_missing, type_name, ValueKind};
