use docstore_adapter::options::{
    BulkRemoveOptions, FindOptions, InsertOptions, ReadOptions, RemoveOptions, UpdateOptions,
};
use docstore_adapter::{
    AdapterConfig, AdapterError, DocumentSession, DocumentStoreAdapter, ErrorKind, Operation,
    Predicate,
};
use serde_json::json;

use crate::support::{adapter, client, config, connected, Market, DB, PASSWORD, USER};

#[tokio::test]
async fn every_operation_requires_connect() {
    let adapter = adapter();
    let all = Predicate::all();

    let results: Vec<AdapterError> = vec![
        adapter.insert(&json!({}), &InsertOptions::default()).await.unwrap_err(),
        adapter
            .insert_many(&[json!({})], &InsertOptions::default())
            .await
            .unwrap_err(),
        adapter.find_by_id("1", &ReadOptions::default()).await.unwrap_err(),
        adapter.find_by_ids(&["1"], &ReadOptions::default()).await.unwrap_err(),
        adapter.find(&all, &FindOptions::default()).await.unwrap_err(),
        adapter.find_one(&all, &ReadOptions::default()).await.unwrap_err(),
        adapter.count(&all, &ReadOptions::default()).await.unwrap_err(),
        adapter
            .update_by_id("1", &json!({}), &UpdateOptions::default())
            .await
            .unwrap_err(),
        adapter
            .update_many(&[json!({ "_key": "1" })], &UpdateOptions::default())
            .await
            .unwrap_err(),
        adapter.remove_by_id("1", &RemoveOptions::default()).await.unwrap_err(),
        adapter.remove_many(&all, &BulkRemoveOptions::default()).await.unwrap_err(),
        adapter.clear(&BulkRemoveOptions::default()).await.unwrap_err(),
    ];

    let operations: Vec<Operation> = results.iter().map(|e| e.operation()).collect();
    assert_eq!(
        operations,
        vec![
            Operation::Insert,
            Operation::InsertMany,
            Operation::FindById,
            Operation::FindByIds,
            Operation::Find,
            Operation::FindOne,
            Operation::Count,
            Operation::UpdateById,
            Operation::UpdateMany,
            Operation::RemoveById,
            Operation::RemoveMany,
            Operation::Clear,
        ]
    );
    assert!(results.iter().all(|e| e.kind() == ErrorKind::NotConnected));
}

#[tokio::test]
async fn rejected_credentials() {
    let mut adapter = DocumentStoreAdapter::new(
        client(),
        AdapterConfig::new(DB).with_credentials(USER, "wrong"),
    );
    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.operation(), Operation::Connect);
    assert!(!adapter.is_connected());
}

#[tokio::test]
async fn incomplete_credentials_are_not_sent() {
    let mut config = AdapterConfig::new(DB);
    config.username = Some(USER.to_string());
    let mut adapter = DocumentStoreAdapter::new(client(), config);

    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn unknown_database() {
    let mut adapter = DocumentStoreAdapter::new(
        client(),
        AdapterConfig::new("nowhere").with_credentials(USER, PASSWORD),
    );
    let err = adapter.connect().await.unwrap_err();
    assert!(matches!(
        err,
        AdapterError::Connection { ref database, .. } if database == "nowhere"
    ));
}

#[tokio::test]
async fn unreachable_server() {
    let client = client();
    client.set_reachable(false);
    let mut adapter = DocumentStoreAdapter::new(client, config());
    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn server_lost_after_connect() {
    let adapter = connected().await;
    adapter.client().set_reachable(false);

    let err = adapter
        .count(&Predicate::all(), &ReadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);

    adapter.client().set_reachable(true);
    assert!(adapter.count(&Predicate::all(), &ReadOptions::default()).await.is_ok());
}

#[tokio::test]
async fn connect_returns_the_live_session() {
    let mut adapter = adapter();
    let session = adapter.connect().await.unwrap();
    let write = session
        .save(
            "markets",
            serde_json::to_value(Market::new("A", 1))
                .unwrap()
                .as_object()
                .cloned()
                .unwrap(),
            &InsertOptions::default(),
        )
        .await
        .unwrap();

    let doc = adapter
        .find_by_id(&write.meta.key, &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(doc.meta(), &write.meta);
}

#[tokio::test]
async fn disconnect_then_reconnect() {
    let mut adapter = connected().await;
    let doc = adapter
        .insert(&Market::new("A", 1), &InsertOptions::default())
        .await
        .unwrap();

    adapter.disconnect().await.unwrap();
    assert!(!adapter.is_connected());
    let err = adapter
        .find_by_id(doc.key(), &ReadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);

    adapter.connect().await.unwrap();
    let again = adapter
        .find_by_id(doc.key(), &ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(again, doc);
}

#[tokio::test]
async fn disconnect_without_session() {
    let mut adapter = adapter();
    let err = adapter.disconnect().await.unwrap_err();
    assert_eq!(
        err,
        AdapterError::NotConnected {
            operation: Operation::Disconnect
        }
    );
}

#[tokio::test]
async fn adapters_on_one_client_share_storage() {
    let client = client();
    let mut writer = DocumentStoreAdapter::new(client.clone(), config());
    let mut reader = DocumentStoreAdapter::new(client, config());
    writer.connect().await.unwrap();
    reader.connect().await.unwrap();

    let doc = writer
        .insert(&Market::new("A", 1), &InsertOptions::default())
        .await
        .unwrap();
    assert_eq!(
        reader.find_by_id(doc.id(), &ReadOptions::default()).await.unwrap(),
        doc
    );
}
