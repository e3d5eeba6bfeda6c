//! Hierarchical CMS entities

use serde::{Deserialize, Serialize};

use crate::algebra::Grant;
use crate::constants::{CATEGORIES, ROLES, TAGS};
use crate::document::{Document, NodeId};
use crate::permission::{Action, Component, PermissionGroup, PermissionRecord};

fn default_true() -> bool {
    true
}

/// A role in the role tree, owning its local permission groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub order: f64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// System-reserved, not editable through normal channels
    #[serde(default)]
    pub protected: bool,
    /// Shown in role pickers
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub permission_groups: Vec<PermissionGroup>,
}

impl Role {
    pub fn new(id: impl Into<NodeId>, name: &str) -> Self {
        Role {
            id: id.into(),
            parent: None,
            order: 0.0,
            name: name.to_string(),
            description: String::new(),
            protected: false,
            visible: true,
            permission_groups: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }

    /// Set one local action setting, creating the group if needed
    pub fn with_permission(mut self, component: impl Into<Component>, action: impl Into<Action>, status: impl Into<Grant>) -> Self {
        self.set_permission(component.into(), action.into(), status.into());
        self
    }

    pub fn set_permission(&mut self, component: Component, action: Action, status: Grant) {
        let group = match self.permission_groups.iter().position(|g| g.name == component) {
            Some(i) => &mut self.permission_groups[i],
            None => {
                self.permission_groups.push(PermissionGroup::new(component, Vec::new()));
                let last = self.permission_groups.len() - 1;
                &mut self.permission_groups[last]
            }
        };
        group.permissions.retain(|r| r.name != action);
        group.permissions.push(PermissionRecord { name: action, status });
    }

    pub fn group(&self, component: &Component) -> Option<&PermissionGroup> {
        self.permission_groups.iter().find(|g| &g.name == component)
    }

    /// Local (non-inherited) setting for one action
    pub fn local_grant(&self, component: &Component, action: &Action) -> Grant {
        self.group(component)
            .map(|g| {
                g.permissions
                    .iter()
                    .filter(|r| &r.name == action)
                    .fold(Grant::Inherit, |acc, r| acc.merge(r.status))
            })
            .unwrap_or_default()
    }
}

impl Document for Role {
    const COLLECTION: &'static str = ROLES;

    fn id(&self) -> &NodeId {
        &self.id
    }
    fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }
    fn order(&self) -> f64 {
        self.order
    }
    fn set_order(&mut self, order: f64) {
        self.order = order;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub order: f64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

impl Category {
    pub fn new(id: impl Into<NodeId>, name: &str) -> Self {
        Category {
            id: id.into(),
            parent: None,
            order: 0.0,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }
}

impl Document for Category {
    const COLLECTION: &'static str = CATEGORIES;

    fn id(&self) -> &NodeId {
        &self.id
    }
    fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }
    fn order(&self) -> f64 {
        self.order
    }
    fn set_order(&mut self, order: f64) {
        self.order = order;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub order: f64,
    pub name: String,
}

impl Tag {
    pub fn new(id: impl Into<NodeId>, name: &str) -> Self {
        Tag { id: id.into(), parent: None, order: 0.0, name: name.to_string() }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }
}

impl Document for Tag {
    const COLLECTION: &'static str = TAGS;

    fn id(&self) -> &NodeId {
        &self.id
    }
    fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }
    fn order(&self) -> f64 {
        self.order
    }
    fn set_order(&mut self, order: f64) {
        self.order = order;
    }
}

/// An authenticated user holding zero or more roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    /// Held role ids, in the order they are merged
    #[serde(default)]
    pub roles: Vec<NodeId>,
}

impl User {
    pub fn new(id: impl Into<NodeId>, roles: Vec<NodeId>) -> Self {
        User { id: id.into(), name: String::new(), roles }
    }
}
