//! Shared fixtures.

use serde_json::{json, Value};
use std::sync::Arc;
use tessera::prelude::*;

/// Install a test log subscriber once. Set `RUST_LOG=debug` to see query logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A small blog schema: users with posts, posts with an author and
/// comments, comments with an author.
pub struct Blog {
    pub db: Arc<Database>,
    pub user: Entity,
    pub post: Entity,
    pub comment: Entity,
}

pub fn blog() -> Blog {
    blog_with(Database::cache())
}

pub fn blog_with(db: Arc<Database>) -> Blog {
    init_tracing();
    let user = db
        .define_entity(
            EntitySchema::new("user")
                .field("id", FieldSchema::number().int())
                .field("name", FieldSchema::string().min(1).trim())
                .field("email", FieldSchema::string().email().optional()),
        )
        .unwrap();
    let post = db
        .define_entity(
            EntitySchema::new("post")
                .field("id", FieldSchema::number().int())
                .field("userId", FieldSchema::number())
                .field("title", FieldSchema::string().max(40))
                .field("published", FieldSchema::boolean().default(false)),
        )
        .unwrap();
    let comment = db
        .define_entity(
            EntitySchema::new("comment")
                .field("id", FieldSchema::string())
                .field("postId", FieldSchema::number())
                .field("userId", FieldSchema::number())
                .field("body", FieldSchema::string()),
        )
        .unwrap();

    db.define_relations(&[&user, &post, &comment], |r| {
        r.many(&user, "posts", &post, "id", "userId");
        r.one(&post, "author", &user, "userId", "id");
        r.many(&post, "comments", &comment, "id", "postId");
        r.one(&comment, "author", &user, "userId", "id");
    })
    .unwrap();

    Blog {
        db,
        user,
        post,
        comment,
    }
}

/// The `id` of every row, in order.
pub fn ids(rows: &[Record]) -> Vec<Value> {
    rows.iter().map(|r| r["id"].clone()).collect()
}

pub fn seed(blog: &Blog) {
    blog.db
        .save(
            &blog.user,
            [
                json!({"id": 1, "name": "Ada", "email": "ada@example.com"}),
                json!({"id": 2, "name": "Grace"}),
            ],
        )
        .unwrap();
    blog.db
        .save(
            &blog.post,
            [
                json!({"id": 10, "userId": 1, "title": "Engines", "published": true}),
                json!({"id": 11, "userId": 1, "title": "Notes"}),
                json!({"id": 12, "userId": 2, "title": "Compilers", "published": true}),
            ],
        )
        .unwrap();
    blog.db
        .save(
            &blog.comment,
            [
                json!({"id": "c1", "postId": 10, "userId": 2, "body": "Great"}),
                json!({"id": "c2", "postId": 10, "userId": 1, "body": "Thanks"}),
            ],
        )
        .unwrap();
}
