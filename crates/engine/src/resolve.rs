//! Relation loading.
//!
//! A [`WithSpec`] is a finite tree of relation names. Resolution walks the
//! tree once per result record: for every requested relation it re-reads
//! the target table, selects the records whose reference field equals the
//! source record's field and attaches them under the relation name.
//!
//! # Design
//!
//! - Relation names are looked up lazily, when a query runs. The whole
//!   tree is checked before any record is touched, so an unknown name
//!   fails even when the query matches nothing.
//! - Entries marked `Skip` are never looked up.
//! - The target table is read again for every relation of every record.
//!   Writes that land between the base scan and resolution are visible in
//!   the attached data.

use serde_json::Value;
use tracing::trace;

use tessera_core::{is_missing, Record, TesseraError, TesseraResult};

use crate::compare::values_equal;
use crate::database::Database;
use crate::relation::RelationKind;

// =============================================================================
// WithSpec
// =============================================================================

/// What to do with one requested relation.
#[derive(Debug, Clone, PartialEq)]
pub enum WithEntry {
    /// Load the relation
    Load,
    /// Explicitly do not load it
    Skip,
    /// Load it, then load these relations on each related record
    Nested(WithSpec),
}

impl WithEntry {
    fn merge(self, other: WithEntry) -> WithEntry {
        match (self, other) {
            (WithEntry::Nested(mut a), WithEntry::Nested(b)) => {
                a.merge(b);
                WithEntry::Nested(a)
            }
            (_, other) => other,
        }
    }
}

/// Relations to attach to query results.
///
/// ```ignore
/// let spec = WithSpec::new()
///     .load("posts")
///     .when("profile", include_profile)
///     .nested("comments", WithSpec::new().load("author"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithSpec {
    entries: Vec<(String, WithEntry)>,
}

impl WithSpec {
    /// Empty spec
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, name: impl Into<String>, entry: WithEntry) -> Self {
        self.insert(name.into(), entry);
        self
    }

    fn insert(&mut self, name: String, entry: WithEntry) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => {
                let previous = std::mem::replace(existing, WithEntry::Skip);
                *existing = previous.merge(entry);
            }
            None => self.entries.push((name, entry)),
        }
    }

    /// Load relation `name`.
    pub fn load(self, name: impl Into<String>) -> Self {
        self.set(name, WithEntry::Load)
    }

    /// Record `name` as not requested.
    pub fn skip(self, name: impl Into<String>) -> Self {
        self.set(name, WithEntry::Skip)
    }

    /// Load `name` only if `condition` holds.
    pub fn when(self, name: impl Into<String>, condition: bool) -> Self {
        if condition {
            self.load(name)
        } else {
            self.skip(name)
        }
    }

    /// Load `name` and, on each related record, the relations in `inner`.
    pub fn nested(self, name: impl Into<String>, inner: WithSpec) -> Self {
        self.set(name, WithEntry::Nested(inner))
    }

    /// Merge `other` into this spec.
    ///
    /// Nested entries merge recursively; otherwise the entry from `other`
    /// replaces an existing one of the same name.
    pub fn merge(&mut self, other: WithSpec) {
        for (name, entry) in other.entries {
            self.insert(name, entry);
        }
    }

    /// Whether no relation is loaded at this level.
    pub fn is_empty(&self) -> bool {
        !self
            .entries
            .iter()
            .any(|(_, entry)| !matches!(entry, WithEntry::Skip))
    }

    /// Entries in request order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &WithEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl From<&str> for WithSpec {
    fn from(name: &str) -> Self {
        WithSpec::new().load(name)
    }
}

impl From<String> for WithSpec {
    fn from(name: String) -> Self {
        WithSpec::new().load(name)
    }
}

impl<const N: usize> From<[&str; N]> for WithSpec {
    fn from(names: [&str; N]) -> Self {
        names.into_iter().fold(WithSpec::new(), WithSpec::load)
    }
}

/// `"posts"`, `["posts", "profile"]` or
/// `{"posts": true, "profile": false, "comments": {"author": true}}`.
impl From<Value> for WithSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::String(name) => WithSpec::new().load(name),
            Value::Array(items) => items.into_iter().fold(WithSpec::new(), |mut spec, item| {
                spec.merge(WithSpec::from(item));
                spec
            }),
            Value::Object(map) => map.into_iter().fold(WithSpec::new(), |spec, (name, v)| match v {
                Value::Object(_) => spec.nested(name, WithSpec::from(v)),
                other => spec.when(name, truthy(&other)),
            }),
            _ => WithSpec::new(),
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Check every requested name in `spec` against the relations of `entity`,
/// descending into nested specs through each relation's target entity.
pub(crate) fn validate_spec(db: &Database, entity: &str, spec: &WithSpec) -> TesseraResult<()> {
    for (name, entry) in spec.entries() {
        if matches!(entry, WithEntry::Skip) {
            continue;
        }
        let relation = db
            .relation(entity, name)
            .ok_or_else(|| TesseraError::relation_not_found(name, entity))?;
        if let WithEntry::Nested(inner) = entry {
            validate_spec(db, &relation.reference.entity, inner)?;
        }
    }
    Ok(())
}

/// Attach the relations requested by `spec` to `record`.
///
/// `record` is the caller's copy; stored records are never modified.
pub(crate) fn attach_relations(
    db: &Database,
    entity: &str,
    record: &mut Record,
    spec: &WithSpec,
) -> TesseraResult<()> {
    for (name, entry) in spec.entries() {
        let inner = match entry {
            WithEntry::Skip => continue,
            WithEntry::Load => None,
            WithEntry::Nested(inner) => Some(inner),
        };
        let relation = db
            .relation(entity, name)
            .ok_or_else(|| TesseraError::relation_not_found(name, entity))?;
        let target = relation.reference.entity.as_str();

        let mut related = load_related(db, record, &relation.field, target, &relation.reference.field)?;
        if relation.kind == RelationKind::One {
            related.truncate(1);
        }
        if let Some(inner) = inner {
            for item in &mut related {
                attach_relations(db, target, item, inner)?;
            }
        }
        trace!(
            entity,
            relation = name,
            related_entity = target,
            matched = related.len(),
            "resolved relation"
        );

        match relation.kind {
            RelationKind::Many => {
                let items = related.into_iter().map(Value::Object).collect();
                record.insert(name.to_string(), Value::Array(items));
            }
            RelationKind::One => {
                if let Some(item) = related.into_iter().next() {
                    record.insert(name.to_string(), Value::Object(item));
                }
            }
        }
    }
    Ok(())
}

/// Records of `target` whose `reference` field equals `source[field]`, in
/// table order. A null or missing key matches nothing.
pub(crate) fn load_related(
    db: &Database,
    source: &Record,
    field: &str,
    target: &str,
    reference: &str,
) -> TesseraResult<Vec<Record>> {
    let key = source.get(field);
    if is_missing(key) {
        return Ok(Vec::new());
    }
    let rows = db.store().get_all(target)?;
    Ok(rows
        .into_iter()
        .filter(|row| values_equal(row.get(reference), key))
        .collect())
}
