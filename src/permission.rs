//! Component and action names, and the registry of valid combinations

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algebra::Grant;
use crate::constants::DEFAULT_DEFINITIONS;
use crate::document::NodeId;
use crate::error::{PermtreeError, Result};

/// Resource category permissions are scoped to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Component {
    /// Super-user group; its `all` action grants everything
    All,
    Article,
    Category,
    Tag,
    User,
    Role,
    Config,
    Unknown(String),
}

impl Component {
    pub fn as_str(&self) -> &str {
        match self {
            Component::All => "all",
            Component::Article => "article",
            Component::Category => "category",
            Component::Tag => "tag",
            Component::User => "user",
            Component::Role => "role",
            Component::Config => "config",
            Component::Unknown(s) => s,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Component::Unknown(_))
    }
}

impl From<&str> for Component {
    fn from(s: &str) -> Self {
        match s {
            "all" => Component::All,
            "article" => Component::Article,
            "category" => Component::Category,
            "tag" => Component::Tag,
            "user" => Component::User,
            "role" => Component::Role,
            "config" => Component::Config,
            other => Component::Unknown(other.to_string()),
        }
    }
}

impl From<String> for Component {
    fn from(s: String) -> Self {
        Component::from(s.as_str())
    }
}

impl From<Component> for String {
    fn from(c: Component) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation within a component
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    All,
    Create,
    Read,
    Edit,
    Delete,
    Publish,
    Reorder,
    Unknown(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::All => "all",
            Action::Create => "create",
            Action::Read => "read",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Publish => "publish",
            Action::Reorder => "reorder",
            Action::Unknown(s) => s,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Action::Unknown(_))
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        match s {
            "all" => Action::All,
            "create" => Action::Create,
            "read" => Action::Read,
            "edit" => Action::Edit,
            "delete" => Action::Delete,
            "publish" => Action::Publish,
            "reorder" => Action::Reorder,
            other => Action::Unknown(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        Action::from(s.as_str())
    }
}

impl From<Action> for String {
    fn from(a: Action) -> Self {
        a.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action setting inside a permission group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub name: Action,
    #[serde(default)]
    pub status: Grant,
}

impl PermissionRecord {
    pub fn new(name: impl Into<Action>, status: impl Into<Grant>) -> Self {
        PermissionRecord { name: name.into(), status: status.into() }
    }
}

/// Records scoped to one component, owned by a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub name: Component,
    #[serde(default)]
    pub permissions: Vec<PermissionRecord>,
}

impl PermissionGroup {
    pub fn new(name: impl Into<Component>, permissions: Vec<PermissionRecord>) -> Self {
        PermissionGroup { name: name.into(), permissions }
    }
}

/// Global configuration entry assigning records to a role for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPermissionEntry {
    pub role: NodeId,
    #[serde(default)]
    pub permissions: Vec<PermissionRecord>,
}

/// Known permission set: which actions each component accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionDefinitions(BTreeMap<Component, BTreeSet<Action>>);

impl Default for PermissionDefinitions {
    fn default() -> Self {
        let mut defs = PermissionDefinitions(BTreeMap::new());
        for (component, actions) in DEFAULT_DEFINITIONS {
            defs.define(Component::from(*component), actions.iter().map(|a| Action::from(*a)));
        }
        defs
    }
}

impl PermissionDefinitions {
    pub fn empty() -> Self {
        PermissionDefinitions(BTreeMap::new())
    }

    /// Register (or extend) a component's accepted actions
    pub fn define(&mut self, component: Component, actions: impl IntoIterator<Item = Action>) {
        self.0.entry(component).or_default().extend(actions);
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.0.keys()
    }

    pub fn actions(&self, component: &Component) -> Option<&BTreeSet<Action>> {
        self.0.get(component)
    }

    pub fn contains(&self, component: &Component, action: &Action) -> bool {
        self.0.get(component).is_some_and(|a| a.contains(action))
    }

    /// Reject names outside the known permission set
    pub fn validate(&self, component: &Component, action: &Action) -> Result<()> {
        let actions = self
            .0
            .get(component)
            .ok_or_else(|| PermtreeError::invalid(format!("unknown component '{}'", component)))?;
        if !actions.contains(action) {
            return Err(PermtreeError::invalid(format!(
                "unknown action '{}' for component '{}'",
                action, component
            )));
        }
        Ok(())
    }
}
