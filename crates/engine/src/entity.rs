//! Entity definitions.
//!
//! An [`Entity`] is a named collection of validated fields with one
//! identity field. Definitions are immutable once built; redefining an
//! entity through [`crate::Database::define_entity`] replaces the handle
//! and resets its table.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use tessera_core::{EntityId, IdKind, Record, TesseraError, TesseraResult, Validator, ValueKind};

/// Identity field used when [`EntitySchema::identity`] is not called.
pub const DEFAULT_ID_FIELD: &str = "id";

/// A field and the validator that guards it.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    validator: Arc<dyn Validator>,
}

impl FieldDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, validator: Arc<dyn Validator>) -> Self {
        Self {
            name: name.into(),
            validator,
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate a raw value, returning the parsed value to store.
    pub fn parse(&self, value: &Value) -> Result<Value, String> {
        self.validator.parse(value)
    }

    /// Kind of value the validator produces.
    pub fn kind(&self) -> ValueKind {
        self.validator.kind()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Declarative input to `define_entity`.
///
/// ```ignore
/// let user = db.define_entity(
///     EntitySchema::new("user")
///         .field("id", FieldSchema::number().int())
///         .field("name", FieldSchema::string().min(2)),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct EntitySchema {
    name: String,
    fields: Vec<FieldDescriptor>,
    id_field: String,
}

impl EntitySchema {
    /// Start a schema for entity `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, validator: impl Validator + 'static) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, Arc::new(validator)));
        self
    }

    /// Declare a field with a shared validator.
    pub fn field_shared(mut self, name: impl Into<String>, validator: Arc<dyn Validator>) -> Self {
        self.fields.push(FieldDescriptor::new(name, validator));
        self
    }

    /// Use `field` as the identity field instead of `id`.
    pub fn identity(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the schema and freeze it into an [`Entity`].
    pub(crate) fn build(self) -> TesseraResult<Entity> {
        if self.name.is_empty() {
            return Err(TesseraError::definition("", "entity name must not be empty"));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(TesseraError::definition(
                    &self.name,
                    format!("field {} is declared twice", field.name),
                ));
            }
        }

        let id_kind = match self.fields.iter().find(|f| f.name == self.id_field) {
            None => {
                return Err(TesseraError::definition(
                    &self.name,
                    format!("identity field {} is not declared", self.id_field),
                ))
            }
            Some(field) if !field.kind().is_identity_kind() => {
                return Err(TesseraError::definition(
                    &self.name,
                    format!(
                        "identity field {} must be a string or number, found {}",
                        self.id_field,
                        field.kind()
                    ),
                ))
            }
            Some(field) if field.kind() == ValueKind::Number => IdKind::Number,
            Some(_) => IdKind::String,
        };

        Ok(Entity {
            inner: Arc::new(EntityInner {
                name: self.name,
                fields: self.fields,
                id_field: self.id_field,
                id_kind,
            }),
        })
    }
}

struct EntityInner {
    name: String,
    fields: Vec<FieldDescriptor>,
    id_field: String,
    id_kind: IdKind,
}

/// Immutable handle to a defined entity. Clone is cheap.
#[derive(Clone)]
pub struct Entity {
    inner: Arc<EntityInner>,
}

impl Entity {
    /// Entity (table) name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.inner.fields
    }

    /// Look up a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.inner.fields.iter().find(|f| f.name == name)
    }

    /// Name of the identity field.
    pub fn id_field(&self) -> &str {
        &self.inner.id_field
    }

    /// Kind of the identity values.
    pub fn id_kind(&self) -> IdKind {
        self.inner.id_kind
    }

    /// Extract the identity of `record`.
    pub fn id_of(&self, record: &Record) -> TesseraResult<EntityId> {
        let raw = record.get(self.id_field()).unwrap_or(&Value::Null);
        let id = EntityId::from_value(raw).ok_or_else(|| {
            TesseraError::invalid_id(
                self.name(),
                format!("{} is not a valid {} id", raw, self.id_kind()),
            )
        })?;
        if !self.id_kind().accepts(&id) {
            return Err(TesseraError::invalid_id(
                self.name(),
                format!("expected a {} id, found {}", self.id_kind(), raw),
            ));
        }
        Ok(id)
    }

    /// Whether two handles refer to the same definition.
    pub fn same_definition(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.fields)
            .field("id_field", &self.inner.id_field)
            .field("id_kind", &self.inner.id_kind)
            .finish()
    }
}
