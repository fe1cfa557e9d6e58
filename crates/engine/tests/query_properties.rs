//! Query Engine Properties
//!
//! End-to-end checks of the documented query contract:
//! - save / find_by_id round-trip
//! - AND and OR chain semantics
//! - ordering with missing values
//! - relation loading (many, one, unknown names)
//! - entity re-registration
//! - first()

use serde_json::{json, Value};
use std::sync::Arc;
use tessera_core::{FieldSchema, Record, TesseraError};
use tessera_engine::{
    Database, Direction, Entity, EntitySchema, FindOptions, Op, QueryOutput, WithSpec,
};

fn user_entity(db: &Database) -> Entity {
    db.define_entity(
        EntitySchema::new("user")
            .field("id", FieldSchema::number())
            .field("name", FieldSchema::string().optional())
            .field("age", FieldSchema::number().optional()),
    )
    .unwrap()
}

fn blog() -> (Arc<Database>, Entity, Entity) {
    let db = Database::cache();
    let user = user_entity(&db);
    let post = db
        .define_entity(
            EntitySchema::new("post")
                .field("id", FieldSchema::number())
                .field("userId", FieldSchema::number()),
        )
        .unwrap();
    db.define_relations(&[&user, &post], |r| {
        r.many(&user, "posts", &post, "id", "userId");
        r.one(&post, "author", &user, "userId", "id");
    })
    .unwrap();
    (db, user, post)
}

fn ids(rows: &[Record]) -> Vec<Value> {
    rows.iter().map(|r| r["id"].clone()).collect()
}

fn age(record: &Record) -> Option<i64> {
    record.get("age").and_then(Value::as_i64)
}

/// Test: a saved record comes back field for field, post-parsing
#[test]
fn test_save_then_find_round_trip() {
    let db = Database::cache();
    let user = user_entity(&db);
    db.save(&user, [json!({"id": 1, "name": "Ada", "age": 36})])
        .unwrap();

    let found = db.find_by_id(&user, 1, FindOptions::new()).unwrap().unwrap();
    assert_eq!(
        Value::Object(found),
        json!({"id": 1, "name": "Ada", "age": 36})
    );
}

/// Test: chained filters equal the conjunction, in table order
#[test]
fn test_and_chain() {
    let db = Database::cache();
    let user = user_entity(&db);
    db.save(
        &user,
        (1..=6).map(|i| json!({"id": i, "age": i * 10})),
    )
    .unwrap();

    let rows = db
        .query(&user)
        .filter("age", Op::Gt, 15)
        .filter_fn(|u| age(u).map_or(false, |a| a % 20 == 0))
        .get()
        .unwrap()
        .into_rows();
    assert_eq!(ids(&rows), vec![json!(2), json!(4), json!(6)]);
}

/// Test: OR results are appended after AND results without duplicates
#[test]
fn test_or_chain() {
    let db = Database::cache();
    let user = user_entity(&db);
    db.save(
        &user,
        [
            json!({"id": 1, "name": "a", "age": 10}),
            json!({"id": 2, "name": "b", "age": 20}),
            json!({"id": 3, "name": "c", "age": 30}),
        ],
    )
    .unwrap();

    let rows = db
        .query(&user)
        .filter("age", Op::Ge, 20)
        .or_filter("name", Op::Eq, "a")
        .or_filter("name", Op::Eq, "b")
        .get()
        .unwrap()
        .into_rows();
    assert_eq!(ids(&rows), vec![json!(2), json!(3), json!(1)]);
}

/// Test: or_filter without filter is a usage error raised by get()
#[test]
fn test_or_without_where() {
    let db = Database::cache();
    let user = user_entity(&db);
    let err = db
        .query(&user)
        .or_filter_fn(|_| true)
        .get()
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot use orWhere without where");
}

/// Test: missing values sort last ascending and first descending
#[test]
fn test_order_with_missing_values() {
    let db = Database::cache();
    let user = user_entity(&db);
    db.save(&user, [json!({"id": 1}), json!({"id": 2, "age": 30})])
        .unwrap();

    let asc = db
        .query(&user)
        .order_by(["age"], [Direction::Asc])
        .get()
        .unwrap()
        .into_rows();
    assert_eq!(ids(&asc), vec![json!(2), json!(1)]);

    let desc = db
        .query(&user)
        .order_by(["age"], [Direction::Desc])
        .get()
        .unwrap()
        .into_rows();
    assert_eq!(ids(&desc), vec![json!(1), json!(2)]);
}

/// Test: a many relation attaches only matching records, always as an array
#[test]
fn test_many_relation() {
    let (db, user, post) = blog();
    db.save(&user, [json!({"id": 1})]).unwrap();
    db.save(
        &post,
        [json!({"id": 1, "userId": 1}), json!({"id": 2, "userId": 2})],
    )
    .unwrap();

    let found = db
        .find_by_id(&user, 1, FindOptions::new().with(json!({"posts": true})))
        .unwrap()
        .unwrap();
    assert_eq!(found["posts"], json!([{"id": 1, "userId": 1}]));
}

/// Test: a one relation without a match leaves the key out
#[test]
fn test_one_relation_absent() {
    let (db, _, post) = blog();
    db.save(&post, [json!({"id": 1, "userId": 99})]).unwrap();

    let rows = db
        .query(&post)
        .with("author")
        .get()
        .unwrap()
        .into_rows();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].contains_key("author"));
}

/// Test: one relation with a match attaches an object
#[test]
fn test_one_relation_present() {
    let (db, user, post) = blog();
    db.save(&user, [json!({"id": 5, "name": "Eve"})]).unwrap();
    db.save(&post, [json!({"id": 1, "userId": 5})]).unwrap();

    let first = db
        .query(&post)
        .with(WithSpec::new().load("author"))
        .first()
        .get()
        .unwrap()
        .into_first()
        .unwrap();
    assert_eq!(first["author"]["name"], json!("Eve"));
}

/// Test: unknown relation names fail at get() with the entity named
#[test]
fn test_undeclared_relation() {
    let (db, user, _) = blog();
    let mut query = db.query(&user);
    query.with(json!({"invalidName": true}));
    let err = query.get().unwrap_err();
    assert_eq!(
        err,
        TesseraError::RelationNotFound {
            relation: "invalidName".into(),
            entity: "user".into()
        }
    );
    assert_eq!(err.to_string(), "Relation invalidName not found on entity user");
}

/// Test: false and null entries are no-ops, even for unknown names
#[test]
fn test_conditional_with() {
    let (db, user, _) = blog();
    db.save(&user, [json!({"id": 1})]).unwrap();
    let rows = db
        .query(&user)
        .with(json!({"posts": false, "whatever": null}))
        .get()
        .unwrap()
        .into_rows();
    assert!(!rows[0].contains_key("posts"));
}

/// Test: redefining an entity empties its table
#[test]
fn test_redefinition_resets() {
    let db = Database::cache();
    let user = user_entity(&db);
    db.save(&user, [json!({"id": 1}), json!({"id": 2})]).unwrap();
    assert_eq!(db.query(&user).count().unwrap(), 2);

    let user = user_entity(&db);
    assert_eq!(db.query(&user).count().unwrap(), 0);
    assert!(db.find_by_id(&user, 1, FindOptions::new()).unwrap().is_none());
}

/// Test: first() returns the head of the equivalent list query
#[test]
fn test_first_matches_list_head() {
    let db = Database::cache();
    let user = user_entity(&db);
    db.save(
        &user,
        [
            json!({"id": 1, "age": 40}),
            json!({"id": 2, "age": 20}),
            json!({"id": 3, "age": 30}),
        ],
    )
    .unwrap();

    let list = db
        .query(&user)
        .filter("age", Op::Gt, 15)
        .order_by(["age"], [Direction::Desc])
        .get()
        .unwrap()
        .into_rows();
    let first = db
        .query(&user)
        .filter("age", Op::Gt, 15)
        .order_by(["age"], [Direction::Desc])
        .first()
        .get()
        .unwrap();
    assert_eq!(first, QueryOutput::First(list.first().cloned()));

    let none = db
        .query(&user)
        .filter("age", Op::Gt, 100)
        .first()
        .get()
        .unwrap();
    assert_eq!(none, QueryOutput::First(None));
}

/// Test: ages 10/25/30, age > 15, ascending, first -> id 2
#[test]
fn test_first_adult_scenario() {
    let db = Database::cache();
    let user = user_entity(&db);
    db.save(
        &user,
        [
            json!({"id": 1, "age": 10}),
            json!({"id": 2, "age": 25}),
            json!({"id": 3, "age": 30}),
        ],
    )
    .unwrap();

    let first = db
        .query(&user)
        .filter_fn(|u| age(u).map_or(false, |a| a > 15))
        .order_by(["age"], [Direction::Asc])
        .first()
        .get()
        .unwrap()
        .into_first()
        .unwrap();
    assert_eq!(first["id"], json!(2));
    assert_eq!(first["age"], json!(25));
}

/// Test: relation data reflects the target table at resolution time
#[test]
fn test_relations_read_live_table() {
    let (db, user, post) = blog();
    db.save(&user, [json!({"id": 1})]).unwrap();

    let mut query = db.query(&user);
    query.with("posts");
    assert_eq!(query.get().unwrap().into_rows()[0]["posts"], json!([]));

    db.save(&post, [json!({"id": 9, "userId": 1})]).unwrap();
    query.with("posts");
    assert_eq!(
        query.get().unwrap().into_rows()[0]["posts"],
        json!([{"id": 9, "userId": 1}])
    );
}
