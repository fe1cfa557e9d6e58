//! Multi-key ordering.

use crate::test_utils::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use tessera::prelude::*;
use tessera::Criterion;

fn scores() -> (std::sync::Arc<Database>, Entity) {
    let db = Database::cache();
    let score = db
        .define_entity(
            EntitySchema::new("score")
                .field("id", FieldSchema::number())
                .field("team", FieldSchema::string().optional())
                .field("points", FieldSchema::number().optional()),
        )
        .unwrap();
    (db, score)
}

#[test]
fn test_directions_fall_back_to_last() {
    let (db, score) = scores();
    db.save(
        &score,
        [
            json!({"id": 1, "team": "a", "points": 1}),
            json!({"id": 2, "team": "b", "points": 2}),
            json!({"id": 3, "team": "a", "points": 3}),
        ],
    )
    .unwrap();

    let rows = db
        .query(&score)
        .order_by(["team", "points"], [Direction::Desc])
        .get()
        .unwrap()
        .into_rows();
    assert_eq!(ids(&rows), vec![json!(2), json!(3), json!(1)]);
}

#[test]
fn test_mixed_criteria() {
    let (db, score) = scores();
    db.save(
        &score,
        [
            json!({"id": 1, "team": "Blue", "points": 5}),
            json!({"id": 2, "team": "amber", "points": 5}),
            json!({"id": 3, "points": 9}),
        ],
    )
    .unwrap();

    let lowercase_team = Criterion::extract(|r| match r.get("team").and_then(Value::as_str) {
        Some(team) => json!(team.to_lowercase()),
        None => Value::Null,
    });
    let rows = db
        .query(&score)
        .order_by(
            [Criterion::from("points"), lowercase_team],
            [Direction::Asc, Direction::Asc],
        )
        .get()
        .unwrap()
        .into_rows();
    assert_eq!(ids(&rows), vec![json!(2), json!(1), json!(3)]);
}

proptest! {
    #[test]
    fn ties_keep_table_order(points in proptest::collection::vec(proptest::option::of(0i64..4), 0..20)) {
        let (db, score) = scores();
        let input: Vec<Value> = points
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"id": i, "points": p}))
            .collect();
        db.save(&score, input).unwrap();

        let rows = db
            .query(&score)
            .order_by(["points"], [Direction::Desc])
            .get()
            .unwrap()
            .into_rows();

        let mut expected: Vec<(usize, Option<i64>)> = points.iter().copied().enumerate().collect();
        expected.sort_by(|a, b| match (a.1, b.1) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(x), Some(y)) => y.cmp(&x),
        });
        let expected: Vec<Value> = expected.into_iter().map(|(i, _)| json!(i)).collect();
        prop_assert_eq!(ids(&rows), expected);
    }
}
