//! Relation declarations.
//!
//! A relation is a directed edge from a source entity field to a target
//! entity field: for a source record `r`, the related records are the
//! target records `t` with `t[reference.field] == r[field]`.
//!
//! Declarations are checked against the entities passed to
//! `define_relations`, but relation *names* used in `with` requests are
//! only looked up when a query runs.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use tessera_core::{TesseraError, TesseraResult};

use crate::entity::Entity;

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// At most one related record, attached as an object.
    One,
    /// Any number of related records, attached as an array.
    Many,
}

/// Target side of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Target entity name
    pub entity: String,
    /// Field on the target entity
    pub field: String,
}

/// A declared relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Cardinality
    pub kind: RelationKind,
    /// Field on the source entity
    pub field: String,
    /// Target entity and field
    pub reference: Reference,
}

impl Relation {
    fn new(
        kind: RelationKind,
        target: &Entity,
        field: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            reference: Reference {
                entity: target.name().to_string(),
                field: reference.into(),
            },
        }
    }

    /// A `one` relation to `target`, matching `target[reference] == source[field]`.
    pub fn one(target: &Entity, field: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new(RelationKind::One, target, field, reference)
    }

    /// A `many` relation to `target`, matching `target[reference] == source[field]`.
    pub fn many(target: &Entity, field: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new(RelationKind::Many, target, field, reference)
    }
}

/// Relation maps per source entity.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    by_entity: FxHashMap<String, FxHashMap<String, Relation>>,
}

impl RelationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up relation `name` on `entity`.
    pub fn get(&self, entity: &str, name: &str) -> Option<&Relation> {
        self.by_entity.get(entity).and_then(|map| map.get(name))
    }

    /// All relations declared on `entity`.
    pub fn relations_of(&self, entity: &str) -> Option<&FxHashMap<String, Relation>> {
        self.by_entity.get(entity)
    }

    /// Whether `name` is a relation on `entity`.
    pub fn is_relation(&self, entity: &str, name: &str) -> bool {
        self.get(entity, name).is_some()
    }

    /// Number of declared relations across all entities
    pub fn len(&self) -> usize {
        self.by_entity.values().map(|m| m.len()).sum()
    }

    /// Check if no relation is declared
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the relation maps of every entity present in `other`.
    pub(crate) fn replace_from(&mut self, other: RelationRegistry) {
        for (entity, map) in other.by_entity {
            self.by_entity.insert(entity, map);
        }
    }
}

/// Collects declarations inside `define_relations`.
///
/// ```ignore
/// db.define_relations(&[&user, &post], |r| {
///     r.many(&user, "posts", &post, "id", "userId");
///     r.one(&post, "author", &user, "userId", "id");
/// })?;
/// ```
pub struct RelationsBuilder<'a> {
    entities: &'a [&'a Entity],
    declared: Vec<(String, String, Relation)>,
}

impl<'a> RelationsBuilder<'a> {
    pub(crate) fn new(entities: &'a [&'a Entity]) -> Self {
        Self {
            entities,
            declared: Vec::new(),
        }
    }

    /// Declare relation `name` on `source`.
    pub fn relation(&mut self, source: &Entity, name: impl Into<String>, relation: Relation) -> &mut Self {
        self.declared
            .push((source.name().to_string(), name.into(), relation));
        self
    }

    /// Shorthand for `relation(source, name, Relation::one(target, field, reference))`.
    pub fn one(
        &mut self,
        source: &Entity,
        name: impl Into<String>,
        target: &Entity,
        field: impl Into<String>,
        reference: impl Into<String>,
    ) -> &mut Self {
        self.relation(source, name, Relation::one(target, field, reference))
    }

    /// Shorthand for `relation(source, name, Relation::many(target, field, reference))`.
    pub fn many(
        &mut self,
        source: &Entity,
        name: impl Into<String>,
        target: &Entity,
        field: impl Into<String>,
        reference: impl Into<String>,
    ) -> &mut Self {
        self.relation(source, name, Relation::many(target, field, reference))
    }

    fn known(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().copied().find(|e| e.name() == name)
    }

    /// Validate the declarations and build per-entity relation maps.
    ///
    /// Every entity passed in gets a map, possibly empty.
    pub(crate) fn finish(self) -> TesseraResult<RelationRegistry> {
        let mut registry = RelationRegistry::new();
        for entity in self.entities {
            registry
                .by_entity
                .entry(entity.name().to_string())
                .or_default();
        }

        let mut seen: FxHashSet<(String, String)> = FxHashSet::default();
        for (source_name, name, relation) in &self.declared {
            let source = self.known(source_name).ok_or_else(|| {
                TesseraError::definition(source_name, "entity is not part of this relation set")
            })?;
            let target = self.known(&relation.reference.entity).ok_or_else(|| {
                TesseraError::definition(
                    source_name,
                    format!(
                        "relation {} targets {}, which is not part of this relation set",
                        name, relation.reference.entity
                    ),
                )
            })?;
            if source.field(&relation.field).is_none() {
                return Err(TesseraError::definition(
                    source_name,
                    format!("relation {} uses undeclared field {}", name, relation.field),
                ));
            }
            if target.field(&relation.reference.field).is_none() {
                return Err(TesseraError::definition(
                    source_name,
                    format!(
                        "relation {} references undeclared field {}.{}",
                        name,
                        target.name(),
                        relation.reference.field
                    ),
                ));
            }
            if source.field(name).is_some() {
                return Err(TesseraError::definition(
                    source_name,
                    format!("relation {} shadows a field of the same name", name),
                ));
            }
            if !seen.insert((source_name.clone(), name.clone())) {
                return Err(TesseraError::definition(
                    source_name,
                    format!("relation {} is declared twice", name),
                ));
            }
        }

        for (source, name, relation) in self.declared {
            registry
                .by_entity
                .entry(source)
                .or_default()
                .insert(name, relation);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntitySchema;
    use tessera_core::FieldSchema;

    fn entities() -> (Entity, Entity) {
        let user = EntitySchema::new("user")
            .field("id", FieldSchema::number())
            .field("name", FieldSchema::string())
            .build()
            .unwrap();
        let post = EntitySchema::new("post")
            .field("id", FieldSchema::number())
            .field("userId", FieldSchema::number())
            .build()
            .unwrap();
        (user, post)
    }

    #[test]
    fn factories_build_tagged_relations() {
        let (user, post) = entities();
        let many = Relation::many(&post, "id", "userId");
        assert_eq!(many.kind, RelationKind::Many);
        assert_eq!(many.field, "id");
        assert_eq!(many.reference.entity, "post");
        assert_eq!(many.reference.field, "userId");

        let one = Relation::one(&user, "userId", "id");
        assert_eq!(one.kind, RelationKind::One);
        assert_eq!(one.reference.entity, "user");
    }

    #[test]
    fn builder_produces_lookup_per_entity() {
        let (user, post) = entities();
        let all = [&user, &post];
        let mut builder = RelationsBuilder::new(&all);
        builder
            .many(&user, "posts", &post, "id", "userId")
            .one(&post, "author", &user, "userId", "id");
        let registry = builder.finish().unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.is_relation("user", "posts"));
        assert!(registry.is_relation("post", "author"));
        assert!(!registry.is_relation("user", "author"));
        assert_eq!(
            registry.get("post", "author").map(|r| r.kind),
            Some(RelationKind::One)
        );
    }

    #[test]
    fn entity_without_relations_gets_empty_map() {
        let (user, post) = entities();
        let all = [&user, &post];
        let registry = RelationsBuilder::new(&all).finish().unwrap();
        assert!(registry.is_empty());
        assert!(registry.relations_of("user").is_some());
    }

    #[test]
    fn unknown_target_entity_is_rejected() {
        let (user, post) = entities();
        let only_user = [&user];
        let mut builder = RelationsBuilder::new(&only_user);
        builder.many(&user, "posts", &post, "id", "userId");
        let err = builder.finish().unwrap_err();
        assert!(err.to_string().contains("not part of this relation set"));
    }

    #[test]
    fn undeclared_fields_are_rejected() {
        let (user, post) = entities();
        let all = [&user, &post];
        let mut builder = RelationsBuilder::new(&all);
        builder.many(&user, "posts", &post, "id", "ownerId");
        assert!(builder.finish().is_err());
    }

    #[test]
    fn relation_shadowing_field_is_rejected() {
        let (user, post) = entities();
        let all = [&user, &post];
        let mut builder = RelationsBuilder::new(&all);
        builder.many(&user, "name", &post, "id", "userId");
        assert!(builder.finish().is_err());
    }

    #[test]
    fn duplicate_relation_is_rejected() {
        let (user, post) = entities();
        let all = [&user, &post];
        let mut builder = RelationsBuilder::new(&all);
        builder
            .many(&user, "posts", &post, "id", "userId")
            .many(&user, "posts", &post, "id", "userId");
        assert!(builder.finish().is_err());
    }

    #[test]
    fn replace_from_overrides_named_entities_only() {
        let (user, post) = entities();
        let all = [&user, &post];
        let mut builder = RelationsBuilder::new(&all);
        builder.many(&user, "posts", &post, "id", "userId");
        let mut registry = builder.finish().unwrap();

        let only_user = [&user];
        registry.replace_from(RelationsBuilder::new(&only_user).finish().unwrap());
        assert!(!registry.is_relation("user", "posts"));
        assert!(registry.relations_of("post").is_some());
    }
}
