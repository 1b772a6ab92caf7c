use axum::http::Method;
use docstore_adapter::options::{
    BulkRemoveOptions, FindOptions, InsertOptions, ReadOptions, RemoveOptions, RevisionPolicy,
    UpdateOptions,
};
use docstore_adapter::{
    AdapterError, ArangoClient, DocumentStoreAdapter, ErrorKind, Predicate, StoreError,
};
use serde_json::{json, Value};

use crate::support::{
    arango_error, config, connected, start, stored, with_version, BASIC_AUTH, DB,
};

fn cursor_path() -> String {
    format!("/_db/{DB}/_api/cursor")
}

fn flag(query: &std::collections::HashMap<String, String>, name: &str) -> Option<bool> {
    query.get(name).map(|v| v == "true")
}

#[tokio::test]
async fn connect_probes_version_with_basic_auth() {
    let fake = start(with_version(|_| arango_error(404, 404))).await;
    let adapter = connected(&fake).await;
    assert!(adapter.is_connected());

    let probe = &fake.requests()[0];
    assert_eq!(probe.method, Method::GET);
    assert_eq!(probe.path, format!("/_db/{DB}/_api/version"));
    assert_eq!(probe.authorization.as_deref(), Some(BASIC_AUTH));
}

#[tokio::test]
async fn connect_maps_rejections_to_connection_errors() {
    for (status, expected) in [
        (401, "authentication rejected"),
        (404, "database not found"),
        (500, "unexpected status"),
    ] {
        let fake = start(move |_| (status, json!({ "error": true }))).await;
        let mut adapter = DocumentStoreAdapter::new(ArangoClient::new(), config(&fake.url));

        let err = adapter.connect().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        match &err {
            AdapterError::Connection {
                source: StoreError::Connection(message),
                ..
            } => assert!(message.contains(expected), "{status}: {message}"),
            other => panic!("{status}: expected connection error, got {other:?}"),
        }
        assert!(!adapter.is_connected());
    }
}

#[tokio::test]
async fn insert_posts_body_with_write_flags() {
    let fake = start(with_version(|req| {
        let doc = stored("1", "_a", json!({ "name": "A" }));
        let mut reply = json!({ "_id": "markets/1", "_key": "1", "_rev": "_a" });
        if req.query.get("returnNew").map(String::as_str) == Some("true") {
            reply["new"] = doc;
        }
        (202, reply)
    }))
    .await;
    let adapter = connected(&fake).await;

    let doc = adapter
        .insert(&json!({ "name": "A" }), &InsertOptions::default().wait_for_sync(true))
        .await
        .unwrap();
    assert_eq!(doc.key(), "1");
    assert_eq!(doc.get("name"), Some(&json!("A")));

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    let save = &calls[0];
    assert_eq!(save.method, Method::POST);
    assert_eq!(save.path, format!("/_db/{DB}/_api/document/markets"));
    assert_eq!(flag(&save.query, "returnNew"), Some(true));
    assert_eq!(flag(&save.query, "waitForSync"), Some(true));
    assert_eq!(flag(&save.query, "overwrite"), Some(false));
    assert_eq!(save.body, json!({ "name": "A" }));
    assert_eq!(save.authorization.as_deref(), Some(BASIC_AUTH));
}

#[tokio::test]
async fn update_sends_merge_flags_and_if_match() {
    let fake = start(with_version(|_| {
        (
            201,
            json!({
                "_id": "markets/a",
                "_key": "a",
                "_rev": "_r2",
                "_oldRev": "_r1",
                "new": stored("a", "_r2", json!({ "price": 2 })),
            }),
        )
    }))
    .await;
    let adapter = connected(&fake).await;

    let doc = adapter
        .update_by_id(
            "markets/a",
            &json!({ "price": 2 }),
            &UpdateOptions::default().keep_null(false).rev("_r1"),
        )
        .await
        .unwrap();
    assert_eq!(doc.rev(), "_r2");

    adapter
        .update_by_id(
            "a",
            &json!({ "price": 3 }),
            &UpdateOptions::default().rev("_r1").policy(RevisionPolicy::Last),
        )
        .await
        .unwrap();

    let calls = fake.calls();
    let checked = &calls[0];
    assert_eq!(checked.method, Method::PATCH);
    assert_eq!(checked.path, format!("/_db/{DB}/_api/document/markets/a"));
    assert_eq!(checked.if_match.as_deref(), Some("_r1"));
    assert_eq!(flag(&checked.query, "keepNull"), Some(false));
    assert_eq!(flag(&checked.query, "mergeObjects"), Some(true));
    assert_eq!(flag(&checked.query, "ignoreRevs"), Some(true));
    assert_eq!(flag(&checked.query, "returnNew"), Some(true));
    assert_eq!(checked.body, json!({ "price": 2 }));

    assert_eq!(calls[1].if_match, None);
}

#[tokio::test]
async fn precondition_failure_is_a_conflict() {
    let fake = start(with_version(|_| {
        (
            412,
            json!({ "error": true, "code": 412, "errorNum": 1200, "_rev": "_r9" }),
        )
    }))
    .await;
    let adapter = connected(&fake).await;

    let err = adapter
        .update_by_id("a", &json!({ "x": 1 }), &UpdateOptions::default().rev("_r1"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    match std::error::Error::source(&err).and_then(|s| s.downcast_ref::<StoreError>()) {
        Some(StoreError::Conflict { actual, key, .. }) => {
            assert_eq!(actual, "_r9");
            assert_eq!(key, "a");
        }
        other => panic!("expected conflict source, got {other:?}"),
    }
}

#[tokio::test]
async fn remove_deletes_one_key_with_if_match() {
    let fake = start(with_version(|_| {
        (200, json!({ "_id": "markets/a", "_key": "a", "_rev": "_r1" }))
    }))
    .await;
    let adapter = connected(&fake).await;

    let ack = adapter
        .remove_by_id("a", &RemoveOptions::default().rev("_r1").return_old(true))
        .await
        .unwrap();
    assert_eq!(ack.meta.key, "a");

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::DELETE);
    assert_eq!(calls[0].path, format!("/_db/{DB}/_api/document/markets/a"));
    assert_eq!(calls[0].if_match.as_deref(), Some("_r1"));
    assert_eq!(flag(&calls[0].query, "returnOld"), Some(true));
}

#[tokio::test]
async fn find_by_id_reads_not_found_as_absent() {
    let fake = start(with_version(|_| arango_error(404, 1202))).await;
    let adapter = connected(&fake).await;

    let err = adapter
        .find_by_id("ghost", &ReadOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(fake.calls()[0].method, Method::GET);
    assert_eq!(fake.calls()[0].path, format!("/_db/{DB}/_api/document/markets/ghost"));
}

#[tokio::test]
async fn find_drains_every_cursor_batch() {
    let fake = start(with_version(|req| {
        if req.method == Method::POST && req.path == cursor_path() {
            (
                201,
                json!({ "result": [stored("a", "_1", json!({ "t": 1 }))], "hasMore": true, "id": "77" }),
            )
        } else if req.method == Method::PUT && req.path == format!("{}/77", cursor_path()) {
            (
                200,
                json!({ "result": [stored("b", "_2", json!({ "t": 1 }))], "hasMore": false }),
            )
        } else {
            arango_error(404, 404)
        }
    }))
    .await;
    let adapter = connected(&fake).await;

    let docs = adapter
        .find(&Predicate::all().with("t", 1), &FindOptions::default().skip(0).limit(10))
        .await
        .unwrap();
    let keys: Vec<&str> = docs.iter().map(|d| d.key()).collect();
    assert_eq!(keys, vec!["a", "b"]);

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    let query = calls[0].body["query"].as_str().unwrap();
    assert!(query.starts_with("FOR d IN @@collection FILTER d[@p0_0] == @v0"));
    assert!(query.contains("LIMIT @offset, @count"));
    let bind = &calls[0].body["bindVars"];
    assert_eq!(bind["@collection"], "markets");
    assert_eq!(bind["p0_0"], "t");
    assert_eq!(bind["v0"], 1);
    assert_eq!(bind["count"], 10);
    assert_eq!(calls[1].method, Method::PUT);
}

#[tokio::test]
async fn remove_many_counts_writes_executed() {
    let fake = start(with_version(|_| {
        (
            201,
            json!({ "result": [], "hasMore": false, "extra": { "stats": { "writesExecuted": 3 } } }),
        )
    }))
    .await;
    let adapter = connected(&fake).await;

    let summary = adapter
        .remove_many(
            &Predicate::all().with("t", 1),
            &BulkRemoveOptions {
                wait_for_sync: true,
                ..BulkRemoveOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(summary.deleted, 3);

    let calls = fake.calls();
    let query = calls[0].body["query"].as_str().unwrap();
    assert!(query.contains("REMOVE d IN @@collection OPTIONS { waitForSync: true }"));
}

#[tokio::test]
async fn missing_collection_is_a_validation_error() {
    let fake = start(with_version(|_| arango_error(404, 1203))).await;
    let adapter = connected(&fake).await;

    let err = adapter
        .find(&Predicate::all(), &FindOptions::in_collection("nowhere"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.collection(), Some("nowhere"));
}

#[tokio::test]
async fn count_reads_the_single_result() {
    let fake = start(with_version(|_| (201, json!({ "result": [4], "hasMore": false })))).await;
    let adapter = connected(&fake).await;

    let count = adapter
        .count(&Predicate::all(), &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(count, 4);
    let body: &Value = &fake.calls()[0].body;
    assert_eq!(
        body["query"],
        "RETURN LENGTH(FOR d IN @@collection RETURN 1)"
    );
}
