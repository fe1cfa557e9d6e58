//! Snapshot persistence.
//!
//! The persisted layout is a single JSON object:
//!
//! ```json
//! { "user": { "1": { "id": 1, "name": "Ada" } }, "tag": { "rust": { "slug": "rust" } } }
//! ```
//!
//! Entity name, then stringified id, then the plain record. Relation data
//! is never stored, so it never appears in a snapshot.
//!
//! On import each key is converted back to an id with the id kind of the
//! matching defined entity. Tables of undefined entities keep string keys.
//! Keys that cannot be converted are skipped with a warning.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use tessera_core::{EntityId, Record, TesseraError, TesseraResult};
use tessera_storage::{Table, TableData};

use crate::database::Database;

type PersistedLayout = BTreeMap<String, BTreeMap<String, Record>>;

impl Database {
    /// Serialize every table to the persisted layout.
    pub fn export_json(&self) -> TesseraResult<String> {
        let data = self.store().get_data();
        let mut root = Map::new();
        for (entity, table) in data {
            let rows: Map<String, Value> = table
                .into_iter()
                .map(|(id, record)| (id.to_string(), Value::Object(record)))
                .collect();
            root.insert(entity, Value::Object(rows));
        }
        Ok(serde_json::to_string_pretty(&Value::Object(root))?)
    }

    /// Replace every table with the contents of a persisted snapshot.
    ///
    /// Defined entities missing from the snapshot end up with an empty
    /// table.
    pub fn import_json(&self, text: &str) -> TesseraResult<()> {
        self.ensure_writable()?;
        let layout: PersistedLayout = serde_json::from_str(text)?;

        let mut data = TableData::new();
        for (entity, rows) in layout {
            let kind = self.entity(&entity).map(|e| e.id_kind());
            let mut table = Table::new();
            for (key, record) in rows {
                let id = match kind {
                    Some(kind) => kind.parse_key(&key),
                    None => Some(EntityId::String(key.clone())),
                };
                match id {
                    Some(id) => {
                        table.insert(id, record);
                    }
                    None => {
                        warn!(entity = %entity, key = %key, "skipping snapshot key with wrong id kind");
                    }
                }
            }
            data.insert(entity, table);
        }
        for name in self.entity_names() {
            data.entry(name).or_default();
        }

        debug!(
            tables = data.len(),
            records = data.values().map(|t| t.len()).sum::<usize>(),
            "imported snapshot"
        );
        self.store().set_data(data);
        Ok(())
    }

    /// Write a snapshot of every table to `path`.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> TesseraResult<()> {
        let text = self.export_json()?;
        fs::write(path.as_ref(), text)?;
        debug!(path = %path.as_ref().display(), "saved snapshot");
        Ok(())
    }

    /// Replace every table with the snapshot stored at `path`.
    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> TesseraResult<()> {
        self.ensure_writable()?;
        let text = fs::read_to_string(path.as_ref()).map_err(TesseraError::from)?;
        self.import_json(&text)
    }
}
