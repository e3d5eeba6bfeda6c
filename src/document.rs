//! Generic hierarchical documents, filters and sort keys
//!
//! Every hierarchical entity (roles, categories, tags) is a JSON document with
//! an `id`, an optional `parent` id and a numeric `order` sort key. Stores
//! hand documents around as `serde_json::Value`; the tree and resolver code
//! converts them into typed [`Document`]s.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{FIELD_ID, FIELD_ORDER};
use crate::error::{PermtreeError, Result};

/// Opaque unique identifier of a document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// Generate a fresh 24-hex-digit id from 12 random bytes
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 12];
        getrandom::getrandom(&mut bytes).map_err(|e| PermtreeError::Storage(e.to_string()))?;
        Ok(NodeId(bytes.iter().map(|b| format!("{:02x}", b)).collect()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// A parent-referencing record stored in a named collection
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the documents of this type live in
    const COLLECTION: &'static str;

    fn id(&self) -> &NodeId;
    fn parent(&self) -> Option<&NodeId>;
    fn order(&self) -> f64;
    fn set_order(&mut self, order: f64);
}

/// Decode a stored document
pub fn from_value<D: Document>(value: Value) -> Result<D> {
    Ok(serde_json::from_value(value)?)
}

/// Encode a document for storage
pub fn to_value<D: Document>(doc: &D) -> Result<Value> {
    Ok(serde_json::to_value(doc)?)
}

/// Top-level field equality constraints. A missing field compares equal to
/// `null`, so `Filter::new().eq("parent", Value::Null)` selects roots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: BTreeMap<String, Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.fields
            .iter()
            .all(|(k, v)| doc.get(k).unwrap_or(&Value::Null) == v)
    }
}

/// Sort specification over one top-level field. Ties are broken by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Default for Sort {
    fn default() -> Self {
        Sort::by_order()
    }
}

impl Sort {
    /// `order` ascending
    pub fn by_order() -> Self {
        Sort::asc(FIELD_ORDER)
    }

    pub fn asc(field: &str) -> Self {
        Sort { field: field.to_string(), descending: false }
    }

    pub fn desc(field: &str) -> Self {
        Sort { field: field.to_string(), descending: true }
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        let ord = if self.descending { ord.reverse() } else { ord };
        ord.then_with(|| compare_values(a.get(FIELD_ID), b.get(FIELD_ID)))
    }

    pub fn sort(&self, docs: &mut [Value]) {
        docs.sort_by(|a, b| self.compare(a, b));
    }
}

// null < bool < number < string < everything else
fn rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_missing_field_is_null() {
        let root = json!({"id": "a", "order": 0});
        let child = json!({"id": "b", "parent": "a", "order": 0});
        let roots = Filter::new().eq("parent", Value::Null);
        assert!(roots.matches(&root));
        assert!(!roots.matches(&child));
        assert!(Filter::new().eq("parent", "a").matches(&child));
        assert!(Filter::new().matches(&child));
    }

    #[test]
    fn test_sort_by_order_then_id() {
        let mut docs = vec![
            json!({"id": "c", "order": 1.5}),
            json!({"id": "b", "order": 0}),
            json!({"id": "a", "order": 1.5}),
        ];
        Sort::by_order().sort(&mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        Sort::desc("order").sort(&mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_generated_ids_differ() {
        let a = NodeId::generate().unwrap();
        let b = NodeId::generate().unwrap();
        assert_eq!(a.as_str().len(), 24);
        assert_ne!(a, b);
    }
}
