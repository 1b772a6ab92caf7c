//! End-to-end walk through the contract on a `markets` collection.

use docstore_adapter::options::{BulkRemoveOptions, InsertOptions, ReadOptions, RemoveOptions};
use docstore_adapter::{Document, Predicate};
use serde_json::json;

use crate::support::connected;

#[tokio::test]
async fn insert_find_remove() {
    let adapter = connected().await;

    let doc = adapter
        .insert(&json!({ "name": "A" }), &InsertOptions::default())
        .await
        .unwrap();
    let value = doc.clone().into_value();
    let object = value.as_object().unwrap();
    let mut fields: Vec<&str> = object.keys().map(String::as_str).collect();
    fields.sort_unstable();
    assert_eq!(fields, vec!["_id", "_key", "_rev", "name"]);
    assert_eq!(value["name"], "A");

    let found = adapter
        .find_by_id(doc.key(), &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(found, doc);

    adapter
        .remove_by_id(doc.key(), &RemoveOptions::default())
        .await
        .unwrap();
    let err = adapter
        .find_by_id(doc.key(), &ReadOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn round_trip_preserves_every_field() {
    let adapter = connected().await;
    let entity = json!({
        "name": "Fish market",
        "tags": ["fresh", "harbour"],
        "venue": { "city": "Bergen", "geo": [60.39, 5.32] },
        "open": true,
        "rating": null,
    });

    let inserted = adapter.insert(&entity, &InsertOptions::default()).await.unwrap();
    let found = adapter
        .find_by_id(inserted.key(), &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(found, inserted);
    assert_eq!(&serde_json::Value::Object(found.fields().clone()), &entity);

    let wire: Document = serde_json::from_value(found.clone().into_value()).unwrap();
    assert_eq!(wire, found);
}

#[tokio::test]
async fn clear_empties_the_collection() {
    let adapter = connected().await;
    adapter
        .insert_many(
            &[json!({ "n": 1 }), json!({ "n": 2 }), json!({ "n": 3 })],
            &InsertOptions::default(),
        )
        .await
        .unwrap();

    adapter.clear(&BulkRemoveOptions::default()).await.unwrap();
    assert_eq!(
        adapter.count(&Predicate::all(), &ReadOptions::default()).await.unwrap(),
        0
    );
}
