//! In-memory document store

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::{Filter, NodeId, Sort};
use crate::error::Result;
use crate::permission::{Component, GlobalPermissionEntry};
use crate::store::{child_filter, select, DocumentStore};

/// Collections of JSON documents held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, BTreeMap<NodeId, Value>>>,
    globals: RwLock<BTreeMap<Component, Vec<GlobalPermissionEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.docs.read().await.get(collection).map_or(0, |c| c.len())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_by_id(&self, collection: &str, id: &NodeId) -> Result<Option<Value>> {
        Ok(self
            .docs
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn fetch_children(
        &self,
        collection: &str,
        parent: Option<&NodeId>,
        filter: &Filter,
        sort: &Sort,
    ) -> Result<Vec<Value>> {
        self.fetch_all(collection, &child_filter(filter, parent), sort).await
    }

    async fn fetch_all(&self, collection: &str, filter: &Filter, sort: &Sort) -> Result<Vec<Value>> {
        let docs = self.docs.read().await;
        let scanned = docs.get(collection).into_iter().flat_map(|c| c.values().cloned());
        Ok(select(scanned, filter, sort))
    }

    async fn persist(&self, collection: &str, id: &NodeId, doc: Value) -> Result<()> {
        self.docs
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), doc);
        Ok(())
    }

    async fn fetch_global_permissions(&self, component: &Component) -> Result<Vec<GlobalPermissionEntry>> {
        Ok(self.globals.read().await.get(component).cloned().unwrap_or_default())
    }

    async fn global_components(&self) -> Result<Vec<Component>> {
        Ok(self.globals.read().await.keys().cloned().collect())
    }

    async fn set_global_permissions(&self, component: &Component, entries: Vec<GlobalPermissionEntry>) -> Result<()> {
        self.globals.write().await.insert(component.clone(), entries);
        Ok(())
    }
}
