use docstore_adapter::options::{BulkRemoveOptions, FindOptions, InsertOptions, ReadOptions, RemoveOptions};
use docstore_adapter::{ErrorKind, Predicate};
use serde_json::{json, Value};

use crate::support::{connected, Market, StoredMarket};

#[tokio::test]
async fn insert_populates_identity() {
    let adapter = connected().await;
    let doc = adapter
        .insert(&Market::new("A", 10), &InsertOptions::default())
        .await
        .unwrap();

    assert_eq!(doc.id(), format!("markets/{}", doc.key()));
    assert!(!doc.rev().is_empty());
    assert_eq!(doc.get("name"), Some(&json!("A")));

    let stored: StoredMarket = doc.decode().unwrap();
    assert_eq!(stored.key, doc.key());
    assert_eq!(stored.rev, doc.rev());
    assert_eq!((stored.name.as_str(), stored.price), ("A", 10));
}

#[tokio::test]
async fn insert_keeps_supplied_key() {
    let adapter = connected().await;
    let doc = adapter
        .insert(&json!({ "_key": "fish", "name": "Fish" }), &InsertOptions::default())
        .await
        .unwrap();
    assert_eq!(doc.key(), "fish");
    assert_eq!(doc.id(), "markets/fish");
}

#[tokio::test]
async fn duplicate_key_needs_overwrite() {
    let adapter = connected().await;
    let first = adapter
        .insert(&json!({ "_key": "a", "v": 1 }), &InsertOptions::default())
        .await
        .unwrap();

    let err = adapter
        .insert(&json!({ "_key": "a", "v": 2 }), &InsertOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let replaced = adapter
        .insert(
            &json!({ "_key": "a", "v": 2 }),
            &InsertOptions::default().overwrite(true),
        )
        .await
        .unwrap();
    assert_eq!(replaced.key(), "a");
    assert_ne!(replaced.rev(), first.rev());
    assert_eq!(replaced.get("v"), Some(&json!(2)));
}

#[tokio::test]
async fn insert_many_returns_documents_in_order() {
    let adapter = connected().await;
    let markets = vec![Market::new("A", 1), Market::new("B", 2), Market::new("C", 3)];
    let docs = adapter
        .insert_many(&markets, &InsertOptions::default())
        .await
        .unwrap();

    let names: Vec<&str> = docs
        .iter()
        .filter_map(|d| d.get("name").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    let keys: std::collections::HashSet<&str> = docs.iter().map(|d| d.key()).collect();
    assert_eq!(keys.len(), 3);
}

#[tokio::test]
async fn insert_many_surfaces_first_element_error_without_rollback() {
    let adapter = connected().await;
    let err = adapter
        .insert_many(
            &[json!({ "_key": "a" }), json!({ "_key": "a" }), json!({ "_key": "b" })],
            &InsertOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let stored = adapter
        .count(&Predicate::all(), &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn find_by_id_misses_with_not_found() {
    let adapter = connected().await;
    let err = adapter
        .find_by_id("missing", &ReadOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.collection(), Some("markets"));
}

#[tokio::test]
async fn find_by_ids_omits_absent_keys() {
    let adapter = connected().await;
    let a = adapter
        .insert(&Market::new("A", 1), &InsertOptions::default())
        .await
        .unwrap();
    let b = adapter
        .insert(&Market::new("B", 2), &InsertOptions::default())
        .await
        .unwrap();

    let found = adapter
        .find_by_ids(&[b.id(), "nope", a.key()], &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(found, vec![b, a]);
}

#[tokio::test]
async fn find_filters_and_pages() {
    let adapter = connected().await;
    for i in 0..5 {
        adapter
            .insert(&json!({ "n": i, "even": i % 2 == 0 }), &InsertOptions::default())
            .await
            .unwrap();
    }

    let evens = adapter
        .find(&Predicate::all().with("even", true), &FindOptions::default())
        .await
        .unwrap();
    let ns: Vec<i64> = evens
        .iter()
        .filter_map(|d| d.get("n").and_then(Value::as_i64))
        .collect();
    assert_eq!(ns, vec![0, 2, 4]);

    let page = adapter
        .find(&Predicate::all(), &FindOptions::default().skip(1).limit(2))
        .await
        .unwrap();
    let ns: Vec<i64> = page
        .iter()
        .filter_map(|d| d.get("n").and_then(Value::as_i64))
        .collect();
    assert_eq!(ns, vec![1, 2]);

    let none = adapter
        .find(&Predicate::all().with("n", 99), &FindOptions::default())
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn nested_examples() {
    let adapter = connected().await;
    adapter
        .insert(
            &json!({ "name": "A", "venue": { "city": "Oslo", "code": 1 } }),
            &InsertOptions::default(),
        )
        .await
        .unwrap();
    adapter
        .insert(&json!({ "name": "B", "venue": { "city": "Bergen" } }), &InsertOptions::default())
        .await
        .unwrap();

    let oslo = Predicate::example(json!({ "venue": { "city": "Oslo" } })).unwrap();
    let found = adapter.find_one(&oslo, &ReadOptions::default()).await.unwrap();
    assert_eq!(found.get("name"), Some(&json!("A")));

    let bergen = Predicate::all().with("venue.city", "Bergen");
    let found = adapter.find_one(&bergen, &ReadOptions::default()).await.unwrap();
    assert_eq!(found.get("name"), Some(&json!("B")));

    let no_code = Predicate::all().with("venue.code", Value::Null);
    assert_eq!(adapter.count(&no_code, &ReadOptions::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn find_one_without_match_is_not_found() {
    let adapter = connected().await;
    let err = adapter
        .find_one(&Predicate::all().with("name", "ghost"), &ReadOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn count_agrees_with_find() {
    let adapter = connected().await;
    for (name, price) in [("A", 1), ("B", 1), ("C", 2), ("A", 3)] {
        adapter
            .insert(&Market::new(name, price), &InsertOptions::default())
            .await
            .unwrap();
    }

    let predicates = [
        Predicate::all(),
        Predicate::all().with("name", "A"),
        Predicate::all().with("price", 1),
        Predicate::all().with("name", "A").with("price", 3),
        Predicate::all().with("name", "Z"),
    ];
    for predicate in &predicates {
        let found = adapter.find(predicate, &FindOptions::default()).await.unwrap();
        let counted = adapter.count(predicate, &ReadOptions::default()).await.unwrap();
        assert_eq!(counted, found.len() as u64, "{:?}", predicate);
    }
}

#[tokio::test]
async fn remove_by_id_twice_is_not_found_both_times() {
    let adapter = connected().await;
    let doc = adapter
        .insert(&Market::new("A", 1), &InsertOptions::default())
        .await
        .unwrap();

    let ack = adapter
        .remove_by_id(doc.key(), &RemoveOptions::default())
        .await
        .unwrap();
    assert_eq!(ack.meta, *doc.meta());

    for _ in 0..2 {
        let err = adapter
            .remove_by_id(doc.key(), &RemoveOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

#[tokio::test]
async fn remove_by_id_removes_exactly_one_document() {
    let adapter = connected().await;
    for key in ["1", "12", "2"] {
        adapter
            .insert(&json!({ "_key": key }), &InsertOptions::default())
            .await
            .unwrap();
    }

    adapter
        .remove_by_id("12", &RemoveOptions::default().return_old(true))
        .await
        .unwrap();

    let left = adapter
        .find_by_ids(&["1", "12", "2"], &ReadOptions::default())
        .await
        .unwrap();
    let keys: Vec<&str> = left.iter().map(|d| d.key()).collect();
    assert_eq!(keys, vec!["1", "2"]);
}

#[tokio::test]
async fn remove_many_and_clear() {
    let adapter = connected().await;
    for (name, price) in [("A", 1), ("B", 1), ("C", 2)] {
        adapter
            .insert(&Market::new(name, price), &InsertOptions::default())
            .await
            .unwrap();
    }

    let summary = adapter
        .remove_many(&Predicate::all().with("price", 1), &BulkRemoveOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.deleted, 2);

    let summary = adapter
        .remove_many(&Predicate::all().with("price", 7), &BulkRemoveOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.deleted, 0);

    let summary = adapter.clear(&BulkRemoveOptions::default()).await.unwrap();
    assert_eq!(summary.deleted, 1);
    assert_eq!(
        adapter.count(&Predicate::all(), &ReadOptions::default()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn reading_an_unwritten_collection_is_empty() {
    let adapter = connected().await;
    let found = adapter
        .find(&Predicate::all(), &FindOptions::in_collection("empty"))
        .await
        .unwrap();
    assert!(found.is_empty());
    assert_eq!(
        adapter
            .count(&Predicate::all(), &ReadOptions::in_collection("empty"))
            .await
            .unwrap(),
        0
    );
}
