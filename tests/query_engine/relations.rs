//! Nested saves and nested relation loading.

use crate::test_utils::*;
use serde_json::json;
use tessera::prelude::*;

#[test]
fn test_nested_save_routes_to_tables() {
    let blog = blog();
    blog.db
        .save(
            &blog.user,
            [json!({
                "id": 1,
                "name": "Ada",
                "posts": [
                    {"id": 10, "userId": 1, "title": "Engines"},
                    {"id": 11, "userId": 1, "title": "Notes"}
                ]
            })],
        )
        .unwrap();

    assert_eq!(blog.db.query(&blog.post).count().unwrap(), 2);
    let stored = blog.db.store().get_all("user").unwrap();
    assert!(!stored[0].contains_key("posts"));
}

#[test]
fn test_two_level_with() {
    let blog = blog();
    seed(&blog);

    let user = blog
        .db
        .find_by_id(
            &blog.user,
            1,
            FindOptions::new().with(json!({"posts": {"comments": {"author": true}}})),
        )
        .unwrap()
        .unwrap();

    let posts = user["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    let comments = posts[0]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["author"]["name"], json!("Grace"));
    assert_eq!(comments[1]["author"]["name"], json!("Ada"));
    assert_eq!(posts[1]["comments"], json!([]));
}

#[test]
fn test_with_on_filtered_query() {
    let blog = blog();
    seed(&blog);

    let rows = blog
        .db
        .query(&blog.post)
        .filter("published", Op::Eq, true)
        .with("author")
        .with(WithSpec::new().when("comments", false))
        .get()
        .unwrap()
        .into_rows();

    assert_eq!(ids(&rows), vec![json!(10), json!(12)]);
    assert_eq!(rows[0]["author"]["name"], json!("Ada"));
    assert_eq!(rows[1]["author"]["name"], json!("Grace"));
    assert!(!rows[0].contains_key("comments"));
}

#[test]
fn test_unknown_nested_relation() {
    let blog = blog();
    seed(&blog);
    let err = blog
        .db
        .query(&blog.user)
        .with(WithSpec::new().nested("posts", WithSpec::from("likes")))
        .get()
        .unwrap_err();
    assert_eq!(err.to_string(), "Relation likes not found on entity post");
}

#[test]
fn test_cyclic_relations_terminate() {
    let blog = blog();
    seed(&blog);

    let spec = WithSpec::new().nested(
        "author",
        WithSpec::new().nested("posts", WithSpec::from("author")),
    );
    let post = blog
        .db
        .find_by_id(&blog.post, 12, FindOptions::new().with(spec))
        .unwrap()
        .unwrap();
    assert_eq!(
        post["author"]["posts"][0]["author"]["name"],
        json!("Grace")
    );
}

#[test]
fn test_typed_results() {
    #[derive(Debug, serde::Deserialize)]
    struct Post {
        id: i64,
        title: String,
        author: Option<Author>,
    }
    #[derive(Debug, serde::Deserialize)]
    struct Author {
        name: String,
    }

    let blog = blog();
    seed(&blog);
    let posts: Vec<Post> = blog
        .db
        .query(&blog.post)
        .filter("userId", Op::Eq, 2)
        .with("author")
        .get()
        .unwrap()
        .deserialize()
        .unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, 12);
    assert_eq!(posts[0].title, "Compilers");
    assert_eq!(posts[0].author.as_ref().map(|a| a.name.as_str()), Some("Grace"));
}
