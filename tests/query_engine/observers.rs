//! Change notifications from the memory store.

use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tessera::prelude::*;
use tessera::{MemoryStore, StoreEvent};

#[test]
fn test_saves_notify_observers() {
    let store = Arc::new(MemoryStore::new());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let subscription = store.subscribe(Arc::new(move |event: &StoreEvent| {
        sink.lock().push(event.clone());
    }));

    let db = Database::open(store.clone(), OpenOptions::default());
    let user = db
        .define_entity(EntitySchema::new("user").field("id", FieldSchema::number()))
        .unwrap();
    let before = store.version();
    db.save(&user, [json!({"id": 1})]).unwrap();
    db.delete(&user, 1).unwrap();
    assert!(store.version() > before);

    let seen: Vec<Option<String>> = events
        .lock()
        .iter()
        .map(|e| e.entity().map(str::to_string))
        .collect();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|e| e.as_deref() == Some("user")));

    assert!(store.unsubscribe(subscription));
    db.save(&user, [json!({"id": 2})]).unwrap();
    assert_eq!(events.lock().len(), 3);
}
