//! Database configuration.
//!
//! [`OpenOptions`] controls how a [`crate::Database`] treats writes. It
//! can be built in code or read from a TOML document:
//!
//! ```toml
//! access_mode = "read_only"
//! write_mode = "validate_first"
//! ```

use serde::{Deserialize, Serialize};
use tessera_core::{TesseraError, TesseraResult};

/// Controls whether the database allows writes or is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Allow both reads and writes (default).
    #[default]
    ReadWrite,
    /// Read-only mode: `save`, `patch`, `delete` and snapshot import fail
    /// with `ReadOnly`.
    ReadOnly,
}

/// When the save pipeline commits records to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Commit each record as soon as it is validated (default).
    ///
    /// A validation failure aborts the call but leaves records committed
    /// before the failing one in place.
    #[default]
    Incremental,
    /// Validate the whole batch first; commit nothing if any object fails.
    ValidateFirst,
}

/// Options for opening a database.
///
/// Use the builder pattern to configure options:
///
/// ```ignore
/// use tessera_engine::{OpenOptions, WriteMode};
///
/// let opts = OpenOptions::new().write_mode(WriteMode::ValidateFirst);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOptions {
    /// The access mode for the database.
    pub access_mode: AccessMode,
    /// How saves commit.
    pub write_mode: WriteMode,
}

impl OpenOptions {
    /// Create a new `OpenOptions` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access mode for the database.
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Set the write mode for the save pipeline.
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Parse options from a TOML document. Missing keys keep defaults.
    pub fn from_toml_str(text: &str) -> TesseraResult<Self> {
        toml::from_str(text).map_err(|e| TesseraError::serialization(e.to_string()))
    }

    /// Whether writes are permitted.
    pub fn is_writable(&self) -> bool {
        self.access_mode == AccessMode::ReadWrite
    }
}
