//! Three-valued permission algebra
//!
//! A setting is `Allow`, `Deny` or `Inherit` (stored as `true`, `false`,
//! `null`). Settings are folded root-to-leaf with [`merge`]: deny wins and
//! stays denied for every level below it, allow is provisional, and inherit
//! defers to whatever was accumulated so far.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::permission::{Action, Component, PermissionRecord};

/// A single permission setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Grant {
    #[default]
    Inherit,
    Allow,
    Deny,
}

impl Grant {
    /// Fold `current` into this accumulated value
    #[inline]
    pub fn merge(self, current: Grant) -> Grant {
        merge(self, current)
    }

    /// Only an explicit allow counts as permitted
    #[inline]
    pub fn is_allowed(self) -> bool {
        self == Grant::Allow
    }
}

impl From<Option<bool>> for Grant {
    fn from(v: Option<bool>) -> Self {
        match v {
            None => Grant::Inherit,
            Some(true) => Grant::Allow,
            Some(false) => Grant::Deny,
        }
    }
}

impl From<Grant> for Option<bool> {
    fn from(g: Grant) -> Self {
        match g {
            Grant::Inherit => None,
            Grant::Allow => Some(true),
            Grant::Deny => Some(false),
        }
    }
}

impl From<bool> for Grant {
    fn from(v: bool) -> Self {
        Grant::from(Some(v))
    }
}

/// Merge an inherited value with the value set at the current level
#[inline]
pub fn merge(inherited: Grant, current: Grant) -> Grant {
    match inherited {
        Grant::Inherit => current,
        Grant::Allow if current == Grant::Deny => Grant::Deny,
        Grant::Allow => Grant::Allow,
        Grant::Deny => Grant::Deny,
    }
}

/// Effective settings: component -> action -> grant.
/// Missing entries read as `Inherit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<Component, BTreeMap<Action, Grant>>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, component: &Component, action: &Action) -> Grant {
        self.0
            .get(component)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_allowed(&self, component: &Component, action: &Action) -> bool {
        self.get(component, action).is_allowed()
    }

    /// Overwrite a single setting
    pub fn set(&mut self, component: Component, action: Action, grant: Grant) {
        self.0.entry(component).or_default().insert(action, grant);
    }

    /// Fold one setting in as the current level
    pub fn apply(&mut self, component: &Component, action: &Action, current: Grant) {
        let slot = self
            .0
            .entry(component.clone())
            .or_default()
            .entry(action.clone())
            .or_default();
        *slot = merge(*slot, current);
    }

    /// Fold a permission group's records in as the current level
    pub fn apply_records(&mut self, component: &Component, records: &[PermissionRecord]) {
        for record in records {
            self.apply(component, &record.name, record.status);
        }
    }

    /// Fold every setting of `current` into this accumulated map
    pub fn merge_from(&mut self, current: &PermissionMap) {
        for (component, actions) in &current.0 {
            for (action, grant) in actions {
                self.apply(component, action, *grant);
            }
        }
    }

    /// Settings of one component, if any were recorded
    pub fn component(&self, component: &Component) -> Option<&BTreeMap<Action, Grant>> {
        self.0.get(component)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|actions| actions.is_empty())
    }
}
