//! Query Engine Test Suite
//!
//! Exercises the public `tessera` API end to end:
//!
//! - **validation**: field validators through the save pipeline
//! - **relations**: nested saves and nested relation loading
//! - **ordering**: multi-key ordering and stability
//! - **snapshots**: persisted layout on disk
//! - **observers**: change notifications from the memory store
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test query_engine
//! ```

mod test_utils;

mod observers;
mod ordering;
mod relations;
mod snapshots;
mod validation;
