//! Identity and record types shared by every crate.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// A stored record: an ordered field-name → value map.
///
/// Stored records carry exactly the fields declared for their entity.
/// Query results may additionally carry attached relation data.
pub type Record = serde_json::Map<String, Value>;

// -2^63 and 2^63: the floats whose integral values fit in an i64.
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
const I64_END_F64: f64 = 9_223_372_036_854_775_808.0;

/// Identity of a record within its entity table.
///
/// The variant is fixed per entity by its [`IdKind`]. Ids are totally
/// ordered: numbers sort before strings, numbers numerically, strings
/// lexicographically. Table order in the in-memory backend is id order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    /// Integer identity
    Number(i64),
    /// String identity
    String(String),
}

impl EntityId {
    /// Extract an id from a JSON value.
    ///
    /// Integral floats (`3.0`) are accepted as numbers. Returns `None` for
    /// any other kind of value, and for numbers outside the `i64` range.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(EntityId::Number(i));
                }
                if n.is_u64() {
                    return None;
                }
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && (I64_MIN_F64..I64_END_F64).contains(f))
                    .map(|f| EntityId::Number(f as i64))
            }
            Value::String(s) => Some(EntityId::String(s.clone())),
            _ => None,
        }
    }

    /// Convert back to a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            EntityId::Number(n) => Value::from(*n),
            EntityId::String(s) => Value::String(s.clone()),
        }
    }

    /// Kind of this id.
    pub fn kind(&self) -> IdKind {
        match self {
            EntityId::Number(_) => IdKind::Number,
            EntityId::String(_) => IdKind::String,
        }
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (EntityId::Number(a), EntityId::Number(b)) => a.cmp(b),
            (EntityId::String(a), EntityId::String(b)) => a.cmp(b),
            (EntityId::Number(_), EntityId::String(_)) => Ordering::Less,
            (EntityId::String(_), EntityId::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Renders the stringified form used as the persisted table key.
impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(v: i64) -> Self {
        EntityId::Number(v)
    }
}

impl From<i32> for EntityId {
    fn from(v: i32) -> Self {
        EntityId::Number(v.into())
    }
}

impl From<u32> for EntityId {
    fn from(v: u32) -> Self {
        EntityId::Number(v.into())
    }
}

impl From<&str> for EntityId {
    fn from(v: &str) -> Self {
        EntityId::String(v.to_string())
    }
}

impl From<String> for EntityId {
    fn from(v: String) -> Self {
        EntityId::String(v)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EntityId::Number(n) => serializer.serialize_i64(*n),
            EntityId::String(s) => serializer.serialize_str(s),
        }
    }
}

struct EntityIdVisitor;

impl<'de> Visitor<'de> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a string id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
        Ok(EntityId::Number(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
        i64::try_from(v)
            .map(EntityId::Number)
            .map_err(|_| E::custom(format!("id {} out of range", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
        Ok(EntityId::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<EntityId, E> {
        Ok(EntityId::String(v))
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}

/// Value type of an entity's identity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    /// Integer ids
    Number,
    /// String ids
    String,
}

impl IdKind {
    /// Recover an id from its stringified (persisted) form.
    ///
    /// Returns `None` when a `Number` kind meets a non-integer key.
    pub fn parse_key(self, key: &str) -> Option<EntityId> {
        match self {
            IdKind::Number => key.parse::<i64>().ok().map(EntityId::Number),
            IdKind::String => Some(EntityId::String(key.to_string())),
        }
    }

    /// Whether `id` has this kind.
    pub fn accepts(self, id: &EntityId) -> bool {
        id.kind() == self
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdKind::Number => f.write_str("number"),
            IdKind::String => f.write_str("string"),
        }
    }
}
