//! Validators through the save pipeline.

use crate::test_utils::*;
use serde_json::json;
use std::sync::Arc;
use tessera::prelude::*;
use tessera::{FnValidator, MemoryStore, ValueKind, WriteMode};

#[test]
fn test_parsed_values_are_stored() {
    let blog = blog();
    blog.db
        .save(&blog.user, [json!({"id": 1, "name": "  Ada  "})])
        .unwrap();
    blog.db
        .save(&blog.post, [json!({"id": 10, "userId": 1, "title": "T"})])
        .unwrap();

    let user = blog
        .db
        .find_by_id(&blog.user, 1, FindOptions::new())
        .unwrap()
        .unwrap();
    assert_eq!(user["name"], json!("Ada"));
    assert_eq!(user["email"], json!(null));

    let post = blog
        .db
        .find_by_id(&blog.post, 10, FindOptions::new())
        .unwrap()
        .unwrap();
    assert_eq!(post["published"], json!(false));
}

#[test]
fn test_messages_surface_unchanged() {
    let blog = blog();
    let cases = [
        (json!({"id": 1, "name": "Ada", "email": "nope"}), "Invalid email"),
        (json!({"id": 1.5, "name": "Ada"}), "Expected integer, received float"),
        (json!({"id": 1, "name": 7}), "Expected string, received number"),
        (json!({"id": 1, "name": ""}), "String must contain at least 1 character(s)"),
    ];
    for (input, message) in cases {
        let err = blog.db.save(&blog.user, [input]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), message);
    }
}

#[test]
fn test_custom_validator() {
    let db = Database::cache();
    let even = FnValidator::new(ValueKind::Number, |value: &serde_json::Value| {
        match value.as_i64() {
            Some(n) if n % 2 == 0 => Ok(value.clone()),
            _ => Err("Must be even".to_string()),
        }
    });
    let pair = db
        .define_entity(EntitySchema::new("pair").field("id", even))
        .unwrap();

    db.save(&pair, [json!({"id": 2})]).unwrap();
    let err = db.save(&pair, [json!({"id": 3})]).unwrap_err();
    assert_eq!(err.to_string(), "Must be even");
}

#[test]
fn test_partial_writes_by_default() {
    let blog = blog();
    let result = blog.db.save(
        &blog.user,
        [
            json!({"id": 1, "name": "Ada"}),
            json!({"id": 2, "name": "Grace", "email": "bad"}),
        ],
    );
    assert!(result.is_err());
    assert_eq!(blog.db.query(&blog.user).count().unwrap(), 1);
}

#[test]
fn test_validate_first_is_all_or_nothing() {
    let db = Database::open(
        Arc::new(MemoryStore::new()),
        OpenOptions::new().write_mode(WriteMode::ValidateFirst),
    );
    let blog = blog_with(db);
    let result = blog.db.save(
        &blog.user,
        [
            json!({"id": 1, "name": "Ada"}),
            json!({"id": 2, "name": "Grace", "email": "bad"}),
        ],
    );
    assert!(result.is_err());
    assert_eq!(blog.db.query(&blog.user).count().unwrap(), 0);
}

#[test]
fn test_options_from_toml() {
    let options = OpenOptions::from_toml_str("write_mode = \"validate_first\"").unwrap();
    assert_eq!(options.write_mode, WriteMode::ValidateFirst);
    assert!(options.is_writable());
}
