//! Storage layer for Tessera
//!
//! This crate provides:
//! - `StorageBackend`: the capability contract the engine writes through
//! - `MemoryStore`: sharded in-process backend
//! - `StoreObserver`: change notifications for reactivity adapters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod memory;
pub mod observer;

pub use backend::{StorageBackend, Table, TableData};
pub use memory::{MemoryStore, Shard};
pub use observer::{Observers, StoreEvent, StoreObserver, SubscriptionId};
