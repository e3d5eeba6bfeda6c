//! LMDB-backed document store
//!
//! Two named databases:
//! - `docs`: [collection][id] -> JSON document
//! - `globals`: component -> JSON list of global permission entries

use std::path::Path;

use async_trait::async_trait;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use serde_json::Value;
use tracing::debug;

use crate::document::{Filter, NodeId, Sort};
use crate::error::{err, Result};
use crate::keys::{collection_prefix, doc_key};
use crate::permission::{Component, GlobalPermissionEntry};
use crate::store::{child_filter, select, DocumentStore};

/// Document store persisted in an LMDB environment
#[derive(Clone)]
pub struct LmdbStore {
    env: Env,
    docs: Database<Bytes, Bytes>,
    globals: Database<Str, Bytes>,
}

impl LmdbStore {
    /// Open (or create) the environment at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(err)?;
        // SAFETY: LMDB requires no other processes access this path concurrently during open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(1 << 30)
                .max_dbs(2)
                .open(path)
                .map_err(err)?
        };
        let mut tx = env.write_txn().map_err(err)?;
        let docs = env.create_database(&mut tx, Some("docs")).map_err(err)?;
        let globals = env.create_database(&mut tx, Some("globals")).map_err(err)?;
        tx.commit().map_err(err)?;
        debug!(path = %path.display(), "opened lmdb document store");
        Ok(LmdbStore { env, docs, globals })
    }

    /// Clear every collection and the global configuration (for testing)
    pub fn clear_all(&self) -> Result<()> {
        self.write(|s, tx| {
            s.docs.clear(tx).map_err(err)?;
            s.globals.clear(tx).map_err(err)
        })
    }

    fn read<T, F: FnOnce(&Self, &RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        f(self, &self.env.read_txn().map_err(err)?)
    }

    fn write<T, F: FnOnce(&Self, &mut RwTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        let mut tx = self.env.write_txn().map_err(err)?;
        let r = f(self, &mut tx)?;
        tx.commit().map_err(err)?;
        Ok(r)
    }

    fn get_doc(&self, collection: &str, id: &NodeId) -> Result<Option<Value>> {
        let key = doc_key(collection, id.as_str())?;
        self.read(|s, tx| match s.docs.get(tx, &key).map_err(err)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        })
    }

    fn scan(&self, collection: &str) -> Result<Vec<Value>> {
        let prefix = collection_prefix(collection)?;
        self.read(|s, tx| {
            let mut r = Vec::new();
            for item in s.docs.prefix_iter(tx, &prefix).map_err(err)? {
                let (_, bytes) = item.map_err(err)?;
                r.push(serde_json::from_slice(bytes)?);
            }
            Ok(r)
        })
    }

    fn put_doc(&self, collection: &str, id: &NodeId, doc: &Value) -> Result<()> {
        let key = doc_key(collection, id.as_str())?;
        let bytes = serde_json::to_vec(doc)?;
        self.write(|s, tx| s.docs.put(tx, &key, &bytes).map_err(err))
    }

    fn get_globals(&self, component: &Component) -> Result<Vec<GlobalPermissionEntry>> {
        self.read(|s, tx| match s.globals.get(tx, component.as_str()).map_err(err)? {
            Some(bytes) => Ok(serde_json::from_slice(bytes)?),
            None => Ok(Vec::new()),
        })
    }

    fn global_keys(&self) -> Result<Vec<Component>> {
        self.read(|s, tx| {
            let mut r = Vec::new();
            for item in s.globals.iter(tx).map_err(err)? {
                let (component, _) = item.map_err(err)?;
                r.push(Component::from(component));
            }
            Ok(r)
        })
    }

    fn put_globals(&self, component: &Component, entries: &[GlobalPermissionEntry]) -> Result<()> {
        let bytes = serde_json::to_vec(entries)?;
        self.write(|s, tx| s.globals.put(tx, component.as_str(), &bytes).map_err(err))
    }
}

#[async_trait]
impl DocumentStore for LmdbStore {
    async fn fetch_by_id(&self, collection: &str, id: &NodeId) -> Result<Option<Value>> {
        self.get_doc(collection, id)
    }

    async fn fetch_children(
        &self,
        collection: &str,
        parent: Option<&NodeId>,
        filter: &Filter,
        sort: &Sort,
    ) -> Result<Vec<Value>> {
        Ok(select(self.scan(collection)?, &child_filter(filter, parent), sort))
    }

    async fn fetch_all(&self, collection: &str, filter: &Filter, sort: &Sort) -> Result<Vec<Value>> {
        Ok(select(self.scan(collection)?, filter, sort))
    }

    async fn persist(&self, collection: &str, id: &NodeId, doc: Value) -> Result<()> {
        self.put_doc(collection, id, &doc)
    }

    async fn fetch_global_permissions(&self, component: &Component) -> Result<Vec<GlobalPermissionEntry>> {
        self.get_globals(component)
    }

    async fn global_components(&self) -> Result<Vec<Component>> {
        self.global_keys()
    }

    async fn set_global_permissions(&self, component: &Component, entries: Vec<GlobalPermissionEntry>) -> Result<()> {
        self.put_globals(component, &entries)
    }
}
