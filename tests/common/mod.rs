//! Shared fixtures for integration tests

#![allow(dead_code)]

use permtree::{store, Document, DocumentStore, GlobalPermissionEntry, MemoryStore, NodeId, PermissionRecord};
use permtree::Component;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

/// Memory store preloaded with `docs`
pub async fn store_with<D: Document>(docs: Vec<D>) -> MemoryStore {
    init_tracing();
    let s = MemoryStore::new();
    insert(&s, docs).await;
    s
}

pub async fn insert<D: Document, S: DocumentStore>(s: &S, docs: Vec<D>) {
    for doc in docs {
        store::save(s, &doc).await.unwrap();
    }
}

/// Assign global-configuration records to a role for one component
pub async fn set_global<S: DocumentStore>(s: &S, component: &str, role: &str, records: Vec<PermissionRecord>) {
    let component = Component::from(component);
    let mut entries = s.fetch_global_permissions(&component).await.unwrap();
    entries.push(GlobalPermissionEntry { role: id(role), permissions: records });
    s.set_global_permissions(&component, entries).await.unwrap();
}

/// Ids and orders of a collection, by order
pub async fn orders<D: Document, S: DocumentStore>(s: &S) -> Vec<(String, f64)> {
    store::all::<D, S>(s, &permtree::Filter::new(), &permtree::Sort::by_order())
        .await
        .unwrap()
        .iter()
        .map(|d| (d.id().to_string(), d.order()))
        .collect()
}
