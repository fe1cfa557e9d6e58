//! The database handle.
//!
//! A [`Database`] owns the storage backend, the entity definitions and the
//! relation registry. Every query, save and snapshot goes through it;
//! there is no process-wide store.
//!
//! # Design
//!
//! - The backend is injected (`Database::open`) or created in memory
//!   (`Database::cache`).
//! - Entity and relation maps sit behind `RwLock`s. Lookups clone what
//!   they return, so no lock is held while a query resolves relations
//!   or a save recurses into nested objects.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use tessera_core::{EntityId, Record, TesseraError, TesseraResult};
use tessera_storage::{MemoryStore, StorageBackend};

use crate::config::{AccessMode, OpenOptions};
use crate::entity::{Entity, EntitySchema};
use crate::query::{FindOptions, Query};
use crate::relation::{Relation, RelationRegistry, RelationsBuilder};
use crate::resolve::{attach_relations, validate_spec};

/// An in-memory, schema-validated object store.
pub struct Database {
    store: Arc<dyn StorageBackend>,
    entities: RwLock<FxHashMap<String, Entity>>,
    relations: RwLock<RelationRegistry>,
    options: OpenOptions,
}

impl Database {
    /// Open an in-memory database with default options.
    pub fn cache() -> Arc<Database> {
        Self::open(Arc::new(MemoryStore::new()), OpenOptions::default())
    }

    /// Open a database over `store`.
    pub fn open(store: Arc<dyn StorageBackend>, options: OpenOptions) -> Arc<Database> {
        debug!(
            access_mode = ?options.access_mode,
            write_mode = ?options.write_mode,
            "opening database"
        );
        Arc::new(Self {
            store,
            entities: RwLock::new(FxHashMap::default()),
            relations: RwLock::new(RelationRegistry::new()),
            options,
        })
    }

    /// Open an in-memory database with `options`.
    pub fn with_options(options: OpenOptions) -> Arc<Database> {
        Self::open(Arc::new(MemoryStore::new()), options)
    }

    /// The storage backend
    pub fn store(&self) -> &Arc<dyn StorageBackend> {
        &self.store
    }

    /// Options this database was opened with
    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    pub(crate) fn ensure_writable(&self) -> TesseraResult<()> {
        if self.options.is_writable() {
            Ok(())
        } else {
            Err(TesseraError::ReadOnly)
        }
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    /// Define (or redefine) an entity and register its table.
    ///
    /// Registering resets the table to empty, so defining the same name
    /// twice discards the records saved in between. A read-only database
    /// keeps a table the backend already holds.
    pub fn define_entity(&self, schema: EntitySchema) -> TesseraResult<Entity> {
        let entity = schema.build()?;
        let name = entity.name().to_string();

        let keep_existing = self.options.access_mode == AccessMode::ReadOnly
            && self.store.entity_names().contains(&name);
        if !keep_existing {
            self.store.register_entity(&name);
        }
        self.entities.write().insert(name.clone(), entity.clone());

        debug!(
            entity = %name,
            fields = entity.fields().len(),
            id_field = entity.id_field(),
            id_kind = %entity.id_kind(),
            "defined entity"
        );
        Ok(entity)
    }

    /// Look up a defined entity by name.
    pub fn entity(&self, name: &str) -> Option<Entity> {
        self.entities.read().get(name).cloned()
    }

    /// Names of all defined entities, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entities.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Declare relations among `entities`.
    ///
    /// Replaces the relation maps of every entity in `entities`; relations
    /// of other entities are kept.
    pub fn define_relations<F>(&self, entities: &[&Entity], declare: F) -> TesseraResult<()>
    where
        F: FnOnce(&mut RelationsBuilder<'_>),
    {
        for entity in entities {
            if self.entity(entity.name()).is_none() {
                return Err(TesseraError::not_registered(entity.name()));
            }
        }
        let mut builder = RelationsBuilder::new(entities);
        declare(&mut builder);
        let registry = builder.finish()?;

        debug!(
            entities = entities.len(),
            relations = registry.len(),
            "defined relations"
        );
        self.relations.write().replace_from(registry);
        Ok(())
    }

    /// Relation `name` on `entity`, if declared.
    pub fn relation(&self, entity: &str, name: &str) -> Option<Relation> {
        self.relations.read().get(entity, name).cloned()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Start a query over `entity`.
    pub fn query(&self, entity: &Entity) -> Query<'_> {
        Query::new(self, entity)
    }

    /// Fetch one record by id, with the relations in `options` attached.
    ///
    /// Unknown relation names fail even when the record does not exist.
    pub fn find_by_id(
        &self,
        entity: &Entity,
        id: impl Into<EntityId>,
        options: FindOptions,
    ) -> TesseraResult<Option<Record>> {
        let id = id.into();
        validate_spec(self, entity.name(), &options.with)?;

        let Some(mut record) = self.store.get_entity(entity.name(), &id)? else {
            return Ok(None);
        };
        attach_relations(self, entity.name(), &mut record, &options.with)?;
        Ok(Some(record))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("entities", &self.entity_names())
            .field("relations", &self.relations.read().len())
            .field("options", &self.options)
            .finish()
    }
}
