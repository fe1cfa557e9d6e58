//! Value classification helpers.
//!
//! Records hold plain `serde_json::Value`s. JSON `null` and an absent key
//! both stand for "no value"; [`is_missing`] is the single place that
//! rule lives.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of value a validator produces.
///
/// Only `String` and `Number` validators may back an identity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// UTF-8 strings
    String,
    /// Integers and floats
    Number,
    /// `true` / `false`
    Boolean,
    /// Anything, including arrays and objects
    Any,
}

impl ValueKind {
    /// Whether a field of this kind can be an entity's identity.
    pub fn is_identity_kind(self) -> bool {
        matches!(self, ValueKind::String | ValueKind::Number)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::String => f.write_str("string"),
            ValueKind::Number => f.write_str("number"),
            ValueKind::Boolean => f.write_str("boolean"),
            ValueKind::Any => f.write_str("any"),
        }
    }
}

/// Whether a looked-up field value counts as null/undefined.
#[inline]
pub fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Type name used in validator messages (`Expected string, received number`).
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
