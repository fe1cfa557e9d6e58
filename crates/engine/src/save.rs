//! Save pipeline.
//!
//! `save` walks each input object key by key, in input order:
//!
//! - a key naming a relation of the entity routes the nested value to the
//!   relation's target table (an array for `many`, an object for `one`),
//!   recursively;
//! - a key naming a field is parsed through the field's validator and the
//!   parsed value is kept;
//! - any other key is dropped.
//!
//! Declared fields missing from the input are parsed from `null`, so a
//! stored record always carries exactly the declared fields.
//!
//! # Write modes
//!
//! With [`WriteMode::Incremental`] every record is committed as soon as
//! it is built: nested records before their parent, objects in input
//! order. A validation failure aborts the call but earlier writes stay.
//! With [`WriteMode::ValidateFirst`] records are staged and committed
//! only once the whole batch has been built.

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use tessera_core::{type_name, EntityId, Record, TesseraError, TesseraResult};

use crate::config::WriteMode;
use crate::database::Database;
use crate::entity::Entity;
use crate::relation::{Relation, RelationKind};

/// Where built records go.
enum Sink {
    Direct,
    Staged(Vec<(String, EntityId, Record)>),
}

impl Sink {
    fn for_mode(mode: WriteMode) -> Self {
        match mode {
            WriteMode::Incremental => Sink::Direct,
            WriteMode::ValidateFirst => Sink::Staged(Vec::new()),
        }
    }

    fn write(&mut self, db: &Database, entity: &str, id: EntityId, record: Record) -> TesseraResult<()> {
        match self {
            Sink::Direct => db.store().set_entity(entity, id, record),
            Sink::Staged(staged) => {
                staged.push((entity.to_string(), id, record));
                Ok(())
            }
        }
    }

    fn commit(self, db: &Database) -> TesseraResult<usize> {
        match self {
            Sink::Direct => Ok(0),
            Sink::Staged(staged) => {
                let n = staged.len();
                for (entity, id, record) in staged {
                    db.store().set_entity(&entity, id, record)?;
                }
                Ok(n)
            }
        }
    }
}

impl Database {
    /// Validate and write `objects` (and any nested relation objects).
    ///
    /// Returns the ids of the top-level records, in input order.
    ///
    /// # Errors
    ///
    /// - `ReadOnly` when the database does not accept writes
    /// - `Validation` with the validator's message when a field fails
    /// - `InvalidId` when a record's identity field has the wrong kind
    pub fn save<I>(&self, entity: &Entity, objects: I) -> TesseraResult<Vec<EntityId>>
    where
        I: IntoIterator<Item = Value>,
    {
        self.ensure_writable()?;
        let mut sink = Sink::for_mode(self.options().write_mode);
        let mut ids = Vec::new();
        for object in objects {
            ids.push(self.save_object(entity, object, &mut sink)?);
        }
        let staged = sink.commit(self)?;
        debug!(entity = entity.name(), saved = ids.len(), staged, "save complete");
        Ok(ids)
    }

    fn save_object(&self, entity: &Entity, object: Value, sink: &mut Sink) -> TesseraResult<EntityId> {
        let input = match object {
            Value::Object(map) => map,
            other => {
                return Err(TesseraError::validation(
                    entity.name(),
                    entity.id_field(),
                    format!("Expected object, received {}", type_name(&other)),
                ))
            }
        };

        let mut parsed: FxHashMap<String, Value> = FxHashMap::default();
        for (key, value) in input {
            if let Some(relation) = self.relation(entity.name(), &key) {
                self.save_related(entity, &key, &relation, value, sink)?;
            } else if let Some(field) = entity.field(&key) {
                let value = field
                    .parse(&value)
                    .map_err(|message| TesseraError::validation(entity.name(), &key, message))?;
                parsed.insert(key, value);
            } else {
                debug!(entity = entity.name(), key = %key, "dropping undeclared key");
            }
        }

        let mut record = Record::new();
        for field in entity.fields() {
            let value = match parsed.remove(field.name()) {
                Some(value) => value,
                None => field
                    .parse(&Value::Null)
                    .map_err(|message| TesseraError::validation(entity.name(), field.name(), message))?,
            };
            record.insert(field.name().to_string(), value);
        }

        let id = entity.id_of(&record)?;
        sink.write(self, entity.name(), id.clone(), record)?;
        Ok(id)
    }

    fn save_related(
        &self,
        entity: &Entity,
        name: &str,
        relation: &Relation,
        value: Value,
        sink: &mut Sink,
    ) -> TesseraResult<()> {
        if value.is_null() {
            return Ok(());
        }
        let target = self
            .entity(&relation.reference.entity)
            .ok_or_else(|| TesseraError::not_registered(&relation.reference.entity))?;
        match (relation.kind, value) {
            (RelationKind::Many, Value::Array(items)) => {
                for item in items {
                    self.save_object(&target, item, sink)?;
                }
                Ok(())
            }
            (RelationKind::Many, other) => Err(TesseraError::validation(
                entity.name(),
                name,
                format!("Expected array, received {}", type_name(&other)),
            )),
            (RelationKind::One, value) => self.save_object(&target, value, sink).map(|_| ()),
        }
    }

    /// Validate `value` and write it to `field` of an existing record.
    ///
    /// The identity field cannot be patched.
    pub fn patch(
        &self,
        entity: &Entity,
        id: impl Into<EntityId>,
        field: &str,
        value: Value,
    ) -> TesseraResult<()> {
        self.ensure_writable()?;
        if field == entity.id_field() {
            return Err(TesseraError::usage(format!(
                "Cannot patch identity field {} of entity {}",
                field,
                entity.name()
            )));
        }
        let descriptor = entity.field(field).ok_or_else(|| {
            TesseraError::validation(entity.name(), field, format!("Unknown field {}", field))
        })?;
        let value = descriptor
            .parse(&value)
            .map_err(|message| TesseraError::validation(entity.name(), field, message))?;
        self.store().set_entity_key(entity.name(), &id.into(), field, value)
    }

    /// Remove one record. Returns whether it existed.
    pub fn delete(&self, entity: &Entity, id: impl Into<EntityId>) -> TesseraResult<bool> {
        self.ensure_writable()?;
        let removed = self.store().remove_entity(entity.name(), &id.into())?;
        Ok(removed.is_some())
    }
}
