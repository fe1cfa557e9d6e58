//! Snapshots on disk.

use crate::test_utils::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use tessera::prelude::*;

#[test]
fn test_snapshot_restores_queries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blog.json");

    let original = blog();
    seed(&original);
    original.db.save_snapshot(&path).unwrap();

    let restored = blog();
    restored.db.load_snapshot(&path).unwrap();

    let user = restored
        .db
        .find_by_id(&restored.user, 1, FindOptions::new().with("posts"))
        .unwrap()
        .unwrap();
    assert_eq!(user["posts"].as_array().map(Vec::len), Some(2));

    let comment = restored
        .db
        .find_by_id(&restored.comment, "c1", FindOptions::new().with("author"))
        .unwrap()
        .unwrap();
    assert_eq!(comment["author"]["name"], json!("Grace"));
}

#[test]
fn test_snapshot_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blog.json");

    let blog = blog();
    seed(&blog);
    blog.db.save_snapshot(&path).unwrap();

    let layout: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(layout["post"]["12"]["title"], json!("Compilers"));
    assert_eq!(layout["comment"]["c2"]["body"], json!("Thanks"));
    assert!(layout["user"]["1"].get("posts").is_none());
}
