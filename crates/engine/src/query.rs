//! Query builder and executor.
//!
//! A [`Query`] accumulates a one-shot plan: an AND-chain of filters, an
//! OR-chain, an ordering, relations to load and a first-only flag.
//! [`Query::get`] executes the plan and clears it, leaving the builder
//! empty and ready for an unrelated query.
//!
//! # Execution order
//!
//! 1. Scan the whole table (ascending id order).
//! 2. Apply the AND filters one after another, each narrowing the result
//!    of the previous one.
//! 3. Evaluate every OR filter against the unfiltered scan and append the
//!    matches not already present, in OR-chain order.
//! 4. Sort (stable).
//! 5. Keep only the first row when `first()` was requested.
//! 6. Attach the requested relations.
//!
//! Truncating before relations are attached only skips resolution work:
//! a `first()` result equals the first element of the list query with
//! its relations loaded.
//!
//! An OR filter with no AND filter fails at `get()` time, not when the OR
//! filter is added.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use tessera_core::{Record, TesseraError, TesseraResult, OR_WITHOUT_WHERE};

use crate::compare::{sort_records, values_equal, Criterion, Direction, Op, OrderBy};
use crate::database::Database;
use crate::entity::Entity;
use crate::resolve::{attach_relations, validate_spec, WithSpec};

type Predicate<'db> = Box<dyn Fn(&Record) -> bool + 'db>;

/// Accumulated state of a query.
#[derive(Default)]
struct QueryPlan<'db> {
    where_filters: Vec<Predicate<'db>>,
    or_filters: Vec<Predicate<'db>>,
    relations: WithSpec,
    order: OrderBy,
    first_only: bool,
}

/// Query builder over one entity's table.
///
/// Created by [`Database::query`]. Not meant to be shared between logical
/// callers; create one per query.
pub struct Query<'db> {
    db: &'db Database,
    entity: Entity,
    plan: QueryPlan<'db>,
}

impl<'db> Query<'db> {
    pub(crate) fn new(db: &'db Database, entity: &Entity) -> Self {
        Self {
            db,
            entity: entity.clone(),
            plan: QueryPlan::default(),
        }
    }

    /// The queried entity
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// AND `field <op> value`.
    pub fn filter(&mut self, field: impl Into<String>, op: Op, value: impl Into<Value>) -> &mut Self {
        let predicate = field_predicate(field.into(), op, value.into());
        self.plan.where_filters.push(predicate);
        self
    }

    /// AND an arbitrary predicate.
    pub fn filter_fn(&mut self, predicate: impl Fn(&Record) -> bool + 'db) -> &mut Self {
        self.plan.where_filters.push(Box::new(predicate));
        self
    }

    /// OR `field <op> value`.
    pub fn or_filter(&mut self, field: impl Into<String>, op: Op, value: impl Into<Value>) -> &mut Self {
        let predicate = field_predicate(field.into(), op, value.into());
        self.plan.or_filters.push(predicate);
        self
    }

    /// OR an arbitrary predicate.
    pub fn or_filter_fn(&mut self, predicate: impl Fn(&Record) -> bool + 'db) -> &mut Self {
        self.plan.or_filters.push(Box::new(predicate));
        self
    }

    /// Order by `criteria`, each paired with the direction at the same
    /// position in `orders` (falling back to the last one, then `Asc`).
    ///
    /// Replaces any ordering set earlier on this plan.
    pub fn order_by<C>(
        &mut self,
        criteria: impl IntoIterator<Item = C>,
        orders: impl IntoIterator<Item = Direction>,
    ) -> &mut Self
    where
        C: Into<Criterion>,
    {
        self.plan.order = OrderBy::new(
            criteria.into_iter().map(Into::into).collect(),
            orders.into_iter().collect(),
        );
        self
    }

    /// Request relations. Repeated calls merge.
    ///
    /// Names are checked against the entity's relations when the query
    /// runs.
    pub fn with(&mut self, spec: impl Into<WithSpec>) -> &mut Self {
        self.plan.relations.merge(spec.into());
        self
    }

    /// Return a single record (or none) instead of a list.
    pub fn first(&mut self) -> &mut Self {
        self.plan.first_only = true;
        self
    }

    /// Execute the plan and reset the builder.
    ///
    /// The builder is reset even when execution fails.
    pub fn get(&mut self) -> TesseraResult<QueryOutput> {
        let plan = std::mem::take(&mut self.plan);
        let name = self.entity.name();

        check_usage(&plan)?;
        validate_spec(self.db, name, &plan.relations)?;

        let mut rows = self.collect(&plan)?;
        let matched = rows.len();
        sort_records(&mut rows, &plan.order);
        if plan.first_only {
            rows.truncate(1);
        }
        if !plan.relations.is_empty() {
            for row in &mut rows {
                attach_relations(self.db, name, row, &plan.relations)?;
            }
        }

        debug!(
            entity = name,
            matched,
            returned = rows.len(),
            first_only = plan.first_only,
            "query executed"
        );

        Ok(if plan.first_only {
            QueryOutput::First(rows.into_iter().next())
        } else {
            QueryOutput::Rows(rows)
        })
    }

    /// Number of records the filters select, capped at one after
    /// `first()`. Resets the builder like [`Query::get`]; relations and
    /// ordering are ignored.
    pub fn count(&mut self) -> TesseraResult<usize> {
        let plan = std::mem::take(&mut self.plan);
        check_usage(&plan)?;
        let n = self.collect(&plan)?.len();
        Ok(if plan.first_only { n.min(1) } else { n })
    }

    /// Steps 1 to 3: scan, AND-narrow, OR-union.
    fn collect(&self, plan: &QueryPlan<'db>) -> TesseraResult<Vec<Record>> {
        let snapshot = self.db.store().get_all(self.entity.name())?;
        let scanned = snapshot.len();

        let (mut rows, original) = if plan.or_filters.is_empty() {
            (snapshot, Vec::new())
        } else {
            (snapshot.clone(), snapshot)
        };
        for predicate in &plan.where_filters {
            rows.retain(|record| predicate(record));
        }

        let id_field = self.entity.id_field();
        for predicate in &plan.or_filters {
            for record in original.iter().filter(|record| predicate(*record)) {
                if !rows.iter().any(|existing| same_record(id_field, existing, record)) {
                    rows.push(record.clone());
                }
            }
        }

        debug!(entity = self.entity.name(), scanned, selected = rows.len(), "table scanned");
        Ok(rows)
    }
}

impl fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("entity", &self.entity.name())
            .field("where_filters", &self.plan.where_filters.len())
            .field("or_filters", &self.plan.or_filters.len())
            .field("relations", &self.plan.relations)
            .field("order", &self.plan.order)
            .field("first_only", &self.plan.first_only)
            .finish()
    }
}

fn field_predicate<'db>(field: String, op: Op, value: Value) -> Predicate<'db> {
    Box::new(move |record: &Record| op.evaluate(record.get(&field), &value))
}

fn check_usage(plan: &QueryPlan<'_>) -> TesseraResult<()> {
    if plan.where_filters.is_empty() && !plan.or_filters.is_empty() {
        return Err(TesseraError::usage(OR_WITHOUT_WHERE));
    }
    Ok(())
}

/// Two scanned records are the same when their ids are equal; records
/// without an id fall back to structural equality.
fn same_record(id_field: &str, a: &Record, b: &Record) -> bool {
    match (a.get(id_field), b.get(id_field)) {
        (Some(x), Some(y)) if !x.is_null() && !y.is_null() => values_equal(Some(x), Some(y)),
        _ => a == b,
    }
}

// =============================================================================
// Results
// =============================================================================

/// Result of [`Query::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// All matching records
    Rows(Vec<Record>),
    /// Result of a `first()` query
    First(Option<Record>),
}

impl QueryOutput {
    /// All returned records; a `First` result yields zero or one.
    pub fn into_rows(self) -> Vec<Record> {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::First(first) => first.into_iter().collect(),
        }
    }

    /// The first returned record, if any.
    pub fn into_first(self) -> Option<Record> {
        match self {
            QueryOutput::Rows(rows) => rows.into_iter().next(),
            QueryOutput::First(first) => first,
        }
    }

    /// Number of returned records
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Rows(rows) => rows.len(),
            QueryOutput::First(first) => usize::from(first.is_some()),
        }
    }

    /// Check if nothing was returned
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deserialize every returned record into `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> TesseraResult<Vec<T>> {
        self.into_rows()
            .into_iter()
            .map(|record| serde_json::from_value(Value::Object(record)).map_err(TesseraError::from))
            .collect()
    }
}

/// Options for [`Database::find_by_id`].
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Relations to attach
    pub with: WithSpec,
}

impl FindOptions {
    /// No relations
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `spec` to the found record.
    pub fn with(mut self, spec: impl Into<WithSpec>) -> Self {
        self.with.merge(spec.into());
        self
    }
}
