//! Permtree - hierarchical role permissions over document trees
//!
//! - Document trees: paths to root, nested trees, flatten/unflatten, fractional reorder
//! - Permission algebra: allow / deny / inherit, deny wins and is sticky downward
//! - Resolver: role-local and global-configuration settings folded root-to-role
//! - Gate: fail-closed `is_permitted` with a universal `all.all` short-circuit
//!
//! Storage is injected through [`DocumentStore`]; [`MemoryStore`] and
//! [`LmdbStore`] are provided.

pub mod algebra;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod gate;
pub mod keys;
pub mod lmdb;
pub mod memory;
pub mod models;
pub mod permission;
pub mod resolver;
pub mod store;
pub mod tree;

pub use algebra::{merge, Grant, PermissionMap};
pub use bootstrap::{ensure_webmaster, BootstrapReport};
pub use config::Config;
pub use document::{Document, Filter, NodeId, Sort};
pub use error::{PermtreeError, Result};
pub use gate::{Actor, PermissionGate};
pub use lmdb::LmdbStore;
pub use memory::MemoryStore;
pub use models::{Category, Role, Tag, User};
pub use permission::{
    Action, Component, GlobalPermissionEntry, PermissionDefinitions, PermissionGroup, PermissionRecord,
};
pub use resolver::Resolver;
pub use store::DocumentStore;
pub use tree::{
    ancestors_of, build_tree, chain_to_root, flatten_tree, path_to_root, renormalize, reorder, unflatten_tree,
    Direction, FlatNode, TreeNode,
};
