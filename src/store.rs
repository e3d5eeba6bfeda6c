//! Document store capability consumed by the tree and permission code
//!
//! The core never owns persistence. Callers inject a [`DocumentStore`] that
//! serves JSON documents keyed by `(collection, id)` plus the global
//! configuration's role-indexed permission lists.

use async_trait::async_trait;
use serde_json::Value;

use crate::constants::FIELD_PARENT;
use crate::document::{from_value, to_value, Document, Filter, NodeId, Sort};
use crate::error::{PermtreeError, Result};
use crate::permission::{Component, GlobalPermissionEntry};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a document by id. Returns None if it does not exist.
    async fn fetch_by_id(&self, collection: &str, id: &NodeId) -> Result<Option<Value>>;

    /// Direct children of `parent` (roots when `parent` is None) matching
    /// `filter`, ordered by `sort`.
    async fn fetch_children(
        &self,
        collection: &str,
        parent: Option<&NodeId>,
        filter: &Filter,
        sort: &Sort,
    ) -> Result<Vec<Value>>;

    /// Every document of a collection matching `filter`, ordered by `sort`.
    async fn fetch_all(&self, collection: &str, filter: &Filter, sort: &Sort) -> Result<Vec<Value>>;

    /// Write back a single document (insert or replace by its `id`).
    async fn persist(&self, collection: &str, id: &NodeId, doc: Value) -> Result<()>;

    /// Global configuration entries for one component.
    async fn fetch_global_permissions(&self, component: &Component) -> Result<Vec<GlobalPermissionEntry>>;

    /// Components that have global configuration entries.
    async fn global_components(&self) -> Result<Vec<Component>>;

    /// Replace the global configuration entries for one component.
    async fn set_global_permissions(&self, component: &Component, entries: Vec<GlobalPermissionEntry>) -> Result<()>;
}

// Typed helpers over the raw JSON capability

/// Fetch and decode a document, failing with `NotFound` if it is missing
pub async fn get<D: Document, S: DocumentStore + ?Sized>(store: &S, id: &NodeId) -> Result<D> {
    match store.fetch_by_id(D::COLLECTION, id).await? {
        Some(v) => from_value(v),
        None => Err(PermtreeError::not_found(D::COLLECTION, id)),
    }
}

pub async fn children<D: Document, S: DocumentStore + ?Sized>(
    store: &S,
    parent: Option<&NodeId>,
    filter: &Filter,
    sort: &Sort,
) -> Result<Vec<D>> {
    store
        .fetch_children(D::COLLECTION, parent, filter, sort)
        .await?
        .into_iter()
        .map(from_value::<D>)
        .collect()
}

pub async fn all<D: Document, S: DocumentStore + ?Sized>(store: &S, filter: &Filter, sort: &Sort) -> Result<Vec<D>> {
    store
        .fetch_all(D::COLLECTION, filter, sort)
        .await?
        .into_iter()
        .map(from_value::<D>)
        .collect()
}

pub async fn save<D: Document, S: DocumentStore + ?Sized>(store: &S, doc: &D) -> Result<()> {
    store.persist(D::COLLECTION, doc.id(), to_value(doc)?).await
}

/// Filter narrowed to the direct children of `parent`
pub(crate) fn child_filter(filter: &Filter, parent: Option<&NodeId>) -> Filter {
    let parent = match parent {
        Some(p) => Value::String(p.as_str().to_string()),
        None => Value::Null,
    };
    filter.clone().eq(FIELD_PARENT, parent)
}

/// Apply a filter and sort to a scanned collection
pub(crate) fn select(docs: impl IntoIterator<Item = Value>, filter: &Filter, sort: &Sort) -> Vec<Value> {
    let mut out: Vec<Value> = docs.into_iter().filter(|d| filter.matches(d)).collect();
    sort.sort(&mut out);
    out
}
