//! Comparison operators and record ordering.
//!
//! Missing values (absent key or `null`) sort as greater than any present
//! value, then the direction is applied: they come last in ascending
//! order and first in descending order.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tessera_core::{is_missing, Record, TesseraError};

// =============================================================================
// Operators
// =============================================================================

/// Comparison operator for field filters.
///
/// Only `Eq` and `Ne` are meaningful for strings compared with other
/// kinds, booleans and nulls; ordering operators evaluate to `false`
/// whenever either side is missing or the kinds differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

const OPERATORS: [(&str, Op); 6] = [
    ("=", Op::Eq),
    ("!=", Op::Ne),
    (">", Op::Gt),
    ("<", Op::Lt),
    (">=", Op::Ge),
    ("<=", Op::Le),
];

impl Op {
    /// Symbol of this operator in the lookup table.
    pub fn symbol(self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(_, op)| *op == self)
            .map(|(s, _)| *s)
            .unwrap_or("?")
    }

    /// Evaluate `lhs <op> rhs`, where `lhs` is a record's field value.
    pub fn evaluate(self, lhs: Option<&Value>, rhs: &Value) -> bool {
        match self {
            Op::Eq => values_equal(lhs, Some(rhs)),
            Op::Ne => !values_equal(lhs, Some(rhs)),
            Op::Gt | Op::Lt | Op::Ge | Op::Le => {
                let Some(lhs) = lhs.filter(|v| !v.is_null()) else {
                    return false;
                };
                if rhs.is_null() || kind_rank(lhs) != kind_rank(rhs) {
                    return false;
                }
                let ord = compare_present(lhs, rhs);
                match self {
                    Op::Gt => ord == Ordering::Greater,
                    Op::Lt => ord == Ordering::Less,
                    Op::Ge => ord != Ordering::Less,
                    _ => ord != Ordering::Greater,
                }
            }
        }
    }
}

impl FromStr for Op {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OPERATORS
            .iter()
            .find(|(symbol, _)| *symbol == s)
            .map(|(_, op)| *op)
            .ok_or_else(|| TesseraError::UnknownOperator {
                symbol: s.to_string(),
            })
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// =============================================================================
// Equality and three-way comparison
// =============================================================================

/// Equality used by `=`/`!=` filters and relation matching.
///
/// Numbers compare numerically (`1 == 1.0`); missing equals missing;
/// arrays and objects compare element-wise with the same rules.
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (is_missing(a), is_missing(b)) {
        (true, true) => return true,
        (true, false) | (false, true) => return false,
        (false, false) => {}
    }
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Ordering::Equal,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(Some(l), Some(r)))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, l)| y.get(k).map_or(false, |r| values_equal(Some(l), Some(r))))
        }
        _ => a == b,
    }
}

/// Integers compare exactly across the `i64` and `u64` ranges; anything
/// involving a float compares as `f64`.
fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    fn integer(n: &Number) -> Option<i128> {
        n.as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
    }
    match (integer(x), integer(y)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
    }
}

/// Rank used when two present values have different kinds.
fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Ascending comparison of two present values.
fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare(Some(l), Some(r), Direction::Asc);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => Ordering::Equal,
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Null-aware three-way comparison.
///
/// - both missing: `Equal`
/// - only `a` missing: `a` after `b` ascending, before `b` descending
/// - only `b` missing: the mirror image
/// - otherwise the natural order, reversed for `Desc`
pub fn compare(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    let ord = match (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null())) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_present(a, b),
    };
    match direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}

// =============================================================================
// Ordering
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending (default)
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl FromStr for Direction {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(TesseraError::usage(format!("Unknown sort direction: {}", other))),
        }
    }
}

type Extractor = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// A sort key: a field name or a function of the record.
#[derive(Clone)]
pub enum Criterion {
    /// Sort by a field's value
    Field(String),
    /// Sort by a computed value; `Value::Null` counts as missing
    Extract(Extractor),
}

impl Criterion {
    /// Sort by field `name`.
    pub fn field(name: impl Into<String>) -> Self {
        Criterion::Field(name.into())
    }

    /// Sort by the value `extract` computes.
    pub fn extract(extract: impl Fn(&Record) -> Value + Send + Sync + 'static) -> Self {
        Criterion::Extract(Arc::new(extract))
    }

    fn key<'r>(&self, record: &'r Record) -> Option<Cow<'r, Value>> {
        match self {
            Criterion::Field(name) => record.get(name).map(Cow::Borrowed),
            Criterion::Extract(extract) => Some(Cow::Owned(extract(record))),
        }
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Criterion::Extract(_) => f.write_str("Extract(..)"),
        }
    }
}

impl From<&str> for Criterion {
    fn from(name: &str) -> Self {
        Criterion::Field(name.to_string())
    }
}

impl From<String> for Criterion {
    fn from(name: String) -> Self {
        Criterion::Field(name)
    }
}

/// Multi-key ordering configuration.
#[derive(Debug, Clone, Default)]
pub struct OrderBy {
    criteria: Vec<Criterion>,
    orders: Vec<Direction>,
}

impl OrderBy {
    /// Order by `criteria`, pairing each with the direction at the same
    /// position in `orders`.
    pub fn new(criteria: Vec<Criterion>, orders: Vec<Direction>) -> Self {
        Self { criteria, orders }
    }

    /// Whether no criterion is configured.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Direction for the `i`-th criterion.
    ///
    /// Falls back to the last declared direction, then to `Asc`. Extra
    /// directions beyond the criteria are never consulted.
    pub fn direction_for(&self, i: usize) -> Direction {
        self.orders
            .get(i)
            .or_else(|| self.orders.last())
            .copied()
            .unwrap_or_default()
    }

    /// Compare two records criterion by criterion.
    pub fn compare_records(&self, a: &Record, b: &Record) -> Ordering {
        for (i, criterion) in self.criteria.iter().enumerate() {
            let ka = criterion.key(a);
            let kb = criterion.key(b);
            let ord = compare(ka.as_deref(), kb.as_deref(), self.direction_for(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Sort `records` in place.
///
/// The sort is stable: records equal on every criterion keep their
/// relative order.
pub fn sort_records(records: &mut [Record], order: &OrderBy) {
    if order.is_empty() {
        return;
    }
    records.sort_by(|a, b| order.compare_records(a, b));
}
