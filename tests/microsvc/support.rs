//! A `markets` service over the in-memory driver.

use docstore_adapter::microsvc::Service;
use docstore_adapter::options::UnknownKeys;
use docstore_adapter::{AdapterConfig, DocumentStoreAdapter, InMemoryClient};

pub const DB: &str = "meta-query";

pub fn adapter(policy: UnknownKeys) -> DocumentStoreAdapter<InMemoryClient> {
    DocumentStoreAdapter::new(
        InMemoryClient::new().with_database(DB),
        AdapterConfig::new(DB)
            .with_collection("markets")
            .with_unknown_options(policy),
    )
}

pub async fn started() -> Service<InMemoryClient> {
    started_with(UnknownKeys::Reject).await
}

pub async fn started_with(policy: UnknownKeys) -> Service<InMemoryClient> {
    let mut service = Service::on_node("markets", "node-test", adapter(policy));
    service.start().await.unwrap();
    service
}
