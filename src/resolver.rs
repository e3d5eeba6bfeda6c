//! Role and user permission resolution
//!
//! A role's effective settings are folded root-to-role over its ancestor
//! chain. At every level the role's local permission groups and the global
//! configuration entries assigned to that role are first merged together,
//! then the level is folded into the running accumulator.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::algebra::PermissionMap;
use crate::document::NodeId;
use crate::error::Result;
use crate::models::{Role, User};
use crate::permission::{Component, GlobalPermissionEntry, PermissionDefinitions};
use crate::store::DocumentStore;
use crate::tree::chain_to_root;

type Globals = BTreeMap<Component, Vec<GlobalPermissionEntry>>;

/// Resolves effective permission maps against a document store
pub struct Resolver<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    definitions: &'a PermissionDefinitions,
}

impl<'a, S: DocumentStore + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a S, definitions: &'a PermissionDefinitions) -> Self {
        Resolver { store, definitions }
    }

    /// Effective settings of a role for every defined component, plus any
    /// other component named by a local group on the chain or by the global
    /// configuration.
    ///
    /// With `inheritance_only` the role's own level is skipped, giving what
    /// the role would inherit if it had no explicit settings.
    pub async fn resolve_role_permissions(&self, role_id: &NodeId, inheritance_only: bool) -> Result<PermissionMap> {
        let chain = self.levels(role_id, inheritance_only).await?;
        let mut components: BTreeSet<Component> = self.definitions.components().cloned().collect();
        for role in &chain {
            components.extend(role.permission_groups.iter().map(|g| g.name.clone()));
        }
        if !chain.is_empty() {
            components.extend(self.store.global_components().await?);
        }
        self.fold(role_id, &chain, &components, inheritance_only).await
    }

    /// Effective settings of a role for a single component
    pub async fn resolve_role_component(
        &self,
        role_id: &NodeId,
        component: &Component,
        inheritance_only: bool,
    ) -> Result<PermissionMap> {
        let chain = self.levels(role_id, inheritance_only).await?;
        let components = BTreeSet::from([component.clone()]);
        self.fold(role_id, &chain, &components, inheritance_only).await
    }

    /// Effective settings of a user: every held role resolved in full, then
    /// folded together in the order the role ids are listed.
    ///
    /// A deny from any role wins regardless of order. An allow against a
    /// missing setting gives allow either way.
    pub async fn resolve_user_permissions(&self, user: &User) -> Result<PermissionMap> {
        let mut acc = PermissionMap::new();
        for role_id in &user.roles {
            acc.merge_from(&self.resolve_role_permissions(role_id, false).await?);
        }
        Ok(acc)
    }

    async fn levels(&self, role_id: &NodeId, inheritance_only: bool) -> Result<Vec<Role>> {
        let mut chain: Vec<Role> = chain_to_root(self.store, role_id).await?;
        if inheritance_only {
            chain.pop();
        }
        Ok(chain)
    }

    async fn fold(
        &self,
        role_id: &NodeId,
        chain: &[Role],
        components: &BTreeSet<Component>,
        inheritance_only: bool,
    ) -> Result<PermissionMap> {
        let mut globals = Globals::new();
        if !chain.is_empty() {
            for component in components {
                let entries = self.store.fetch_global_permissions(component).await?;
                if !entries.is_empty() {
                    globals.insert(component.clone(), entries);
                }
            }
        }

        let mut acc = PermissionMap::new();
        for role in chain {
            acc.merge_from(&level(role, components, &globals));
        }
        debug!(
            role = %role_id,
            levels = chain.len(),
            components = components.len(),
            inheritance_only,
            "resolved role permissions"
        );
        Ok(acc)
    }
}

/// One hierarchy level: local groups merged with global entries for this role
fn level(role: &Role, components: &BTreeSet<Component>, globals: &Globals) -> PermissionMap {
    let mut local = PermissionMap::new();
    for group in role.permission_groups.iter().filter(|g| components.contains(&g.name)) {
        local.apply_records(&group.name, &group.permissions);
    }

    let mut global = PermissionMap::new();
    for (component, entries) in globals {
        for entry in entries.iter().filter(|e| e.role == role.id) {
            global.apply_records(component, &entry.permissions);
        }
    }

    local.merge_from(&global);
    local
}
