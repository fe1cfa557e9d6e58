//! Field validators.
//!
//! The store consumes validation as a capability: a [`Validator`] turns a
//! raw input value into the parsed value that is written, or rejects it
//! with a human-readable message. The message is surfaced to callers
//! unchanged.
//!
//! [`FieldSchema`] is the built-in validator set. Any other schema
//! library can be plugged in through [`FnValidator`] or a custom
//! [`Validator`] impl.

use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

use crate::value::{type_name, ValueKind};

/// Validation capability for one field.
pub trait Validator: Send + Sync {
    /// Validate and coerce `value`.
    ///
    /// A missing input is presented as `Value::Null`. On failure the
    /// returned message is propagated verbatim.
    fn parse(&self, value: &Value) -> Result<Value, String>;

    /// Kind of value this validator produces.
    fn kind(&self) -> ValueKind;
}

impl<V: Validator + ?Sized> Validator for Arc<V> {
    fn parse(&self, value: &Value) -> Result<Value, String> {
        (**self).parse(value)
    }

    fn kind(&self) -> ValueKind {
        (**self).kind()
    }
}

/// Adapts a closure into a [`Validator`].
///
/// ```ignore
/// let even = FnValidator::new(ValueKind::Number, |v| match v.as_i64() {
///     Some(n) if n % 2 == 0 => Ok(v.clone()),
///     _ => Err("Expected an even number".to_string()),
/// });
/// ```
pub struct FnValidator<F> {
    kind: ValueKind,
    parse: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value) -> Result<Value, String> + Send + Sync,
{
    /// Wrap `parse`, declaring the kind of value it produces.
    pub fn new(kind: ValueKind, parse: F) -> Self {
        Self { kind, parse }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> Result<Value, String> + Send + Sync,
{
    fn parse(&self, value: &Value) -> Result<Value, String> {
        (self.parse)(value)
    }

    fn kind(&self) -> ValueKind {
        self.kind
    }
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").field("kind", &self.kind).finish()
    }
}

// =============================================================================
// Built-in schemas
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct Bounds {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
enum Rules {
    String { bounds: Bounds, email: bool, trim: bool },
    Number { bounds: Bounds, int: bool, coerce: bool },
    Boolean,
    Any,
}

/// Built-in declarative validator.
///
/// ```ignore
/// let name = FieldSchema::string().trim().min(2);
/// let age = FieldSchema::number().int().min(0).optional();
/// let email = FieldSchema::string().email();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    rules: Rules,
    optional: bool,
    default: Option<Value>,
}

impl FieldSchema {
    fn with_rules(rules: Rules) -> Self {
        Self {
            rules,
            optional: false,
            default: None,
        }
    }

    /// A string field.
    pub fn string() -> Self {
        Self::with_rules(Rules::String {
            bounds: Bounds::default(),
            email: false,
            trim: false,
        })
    }

    /// A numeric field.
    pub fn number() -> Self {
        Self::with_rules(Rules::Number {
            bounds: Bounds::default(),
            int: false,
            coerce: false,
        })
    }

    /// A boolean field.
    pub fn boolean() -> Self {
        Self::with_rules(Rules::Boolean)
    }

    /// A field accepting any JSON value.
    pub fn any() -> Self {
        Self::with_rules(Rules::Any)
    }

    /// Minimum string length, or minimum number value.
    pub fn min(mut self, n: impl Into<f64>) -> Self {
        if let Some(bounds) = self.bounds_mut() {
            bounds.min = Some(n.into());
        }
        self
    }

    /// Maximum string length, or maximum number value.
    pub fn max(mut self, n: impl Into<f64>) -> Self {
        if let Some(bounds) = self.bounds_mut() {
            bounds.max = Some(n.into());
        }
        self
    }

    /// Require a plausible email address (strings only).
    pub fn email(mut self) -> Self {
        if let Rules::String { email, .. } = &mut self.rules {
            *email = true;
        }
        self
    }

    /// Trim surrounding whitespace before other checks (strings only).
    pub fn trim(mut self) -> Self {
        if let Rules::String { trim, .. } = &mut self.rules {
            *trim = true;
        }
        self
    }

    /// Reject non-integral numbers (numbers only).
    pub fn int(mut self) -> Self {
        if let Rules::Number { int, .. } = &mut self.rules {
            *int = true;
        }
        self
    }

    /// Accept numeric strings such as `"42"` (numbers only).
    pub fn coerce(mut self) -> Self {
        if let Rules::Number { coerce, .. } = &mut self.rules {
            *coerce = true;
        }
        self
    }

    /// Allow the value to be missing; it is stored as `null`.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Substitute `value` when the input is missing.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn bounds_mut(&mut self) -> Option<&mut Bounds> {
        match &mut self.rules {
            Rules::String { bounds, .. } | Rules::Number { bounds, .. } => Some(bounds),
            Rules::Boolean | Rules::Any => None,
        }
    }

    fn parse_string(&self, value: &Value, bounds: &Bounds, email: bool, trim: bool) -> Result<Value, String> {
        let Value::String(raw) = value else {
            return Err(format!("Expected string, received {}", type_name(value)));
        };
        let s = if trim { raw.trim() } else { raw.as_str() };
        let len = s.chars().count() as f64;
        if let Some(min) = bounds.min {
            if len < min {
                return Err(format!(
                    "String must contain at least {} character(s)",
                    format_bound(min)
                ));
            }
        }
        if let Some(max) = bounds.max {
            if len > max {
                return Err(format!(
                    "String must contain at most {} character(s)",
                    format_bound(max)
                ));
            }
        }
        if email && !looks_like_email(s) {
            return Err("Invalid email".to_string());
        }
        Ok(Value::String(s.to_string()))
    }

    fn parse_number(&self, value: &Value, bounds: &Bounds, int: bool, coerce: bool) -> Result<Value, String> {
        let number = match value {
            Value::Number(n) => n.clone(),
            Value::String(s) if coerce => {
                let parsed: f64 = s
                    .trim()
                    .parse()
                    .map_err(|_| "Expected number, received nan".to_string())?;
                number_from_f64(parsed).ok_or_else(|| "Expected number, received nan".to_string())?
            }
            other => return Err(format!("Expected number, received {}", type_name(other))),
        };
        let n = number.as_f64().unwrap_or(f64::NAN);
        if int && n.fract() != 0.0 {
            return Err("Expected integer, received float".to_string());
        }
        if let Some(min) = bounds.min {
            if n < min {
                return Err(format!(
                    "Number must be greater than or equal to {}",
                    format_bound(min)
                ));
            }
        }
        if let Some(max) = bounds.max {
            if n > max {
                return Err(format!(
                    "Number must be less than or equal to {}",
                    format_bound(max)
                ));
            }
        }
        Ok(Value::Number(number))
    }
}

impl Validator for FieldSchema {
    fn parse(&self, value: &Value) -> Result<Value, String> {
        if value.is_null() {
            if let Some(default) = &self.default {
                return Ok(default.clone());
            }
            if self.optional {
                return Ok(Value::Null);
            }
            return Err("Required".to_string());
        }
        match &self.rules {
            Rules::String { bounds, email, trim } => self.parse_string(value, bounds, *email, *trim),
            Rules::Number { bounds, int, coerce } => self.parse_number(value, bounds, *int, *coerce),
            Rules::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                other => Err(format!("Expected boolean, received {}", type_name(other))),
            },
            Rules::Any => Ok(value.clone()),
        }
    }

    fn kind(&self) -> ValueKind {
        match self.rules {
            Rules::String { .. } => ValueKind::String,
            Rules::Number { .. } => ValueKind::Number,
            Rules::Boolean => ValueKind::Boolean,
            Rules::Any => ValueKind::Any,
        }
    }
}

/// Integral numbers keep an integer representation so ids stay usable.
fn number_from_f64(n: f64) -> Option<Number> {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

fn format_bound(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
            .unwrap_or(false)
}
