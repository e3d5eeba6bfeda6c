//! Startup self-healing of the Webmaster role

use tracing::info;

use crate::algebra::Grant;
use crate::config::Config;
use crate::constants::{FIELD_NAME, WEBMASTER_DESCRIPTION};
use crate::document::{Filter, NodeId, Sort};
use crate::error::Result;
use crate::models::Role;
use crate::permission::{Action, Component};
use crate::store::{self, DocumentStore};

/// Outcome of [`ensure_webmaster`]
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    pub role: Role,
    /// The role did not exist and was created
    pub created: bool,
    /// The role existed but had drifted and was rewritten
    pub repaired: bool,
}

/// Make sure the Webmaster role exists as a protected root holding
/// `all.all = true`, with no global-configuration record taking that grant
/// away. Idempotent: a second call changes nothing.
pub async fn ensure_webmaster<S: DocumentStore + ?Sized>(store: &S, config: &Config) -> Result<BootstrapReport> {
    let name = config.webmaster_role.as_str();
    let found: Vec<Role> = store::all(store, &Filter::new().eq(FIELD_NAME, name), &Sort::by_order()).await?;

    let Some(mut role) = found.into_iter().next() else {
        let roots: Vec<Role> = store::children(store, None, &Filter::new(), &Sort::by_order()).await?;
        let mut role = Role::new(NodeId::generate()?, name)
            .with_order(roots.len() as f64)
            .with_permission(Component::All, Action::All, Grant::Allow);
        role.description = WEBMASTER_DESCRIPTION.to_string();
        role.protected = true;
        store::save(store, &role).await?;
        info!(role = %role.id, name, "created webmaster role");
        return Ok(BootstrapReport { role, created: true, repaired: false });
    };

    let mut repaired = false;
    if !role.protected {
        role.protected = true;
        repaired = true;
    }
    // A parent could deny all.all above it, and deny is sticky
    if role.parent.is_some() {
        role.parent = None;
        repaired = true;
    }
    if role.local_grant(&Component::All, &Action::All) != Grant::Allow {
        role.set_permission(Component::All, Action::All, Grant::Allow);
        repaired = true;
    }
    if repaired {
        store::save(store, &role).await?;
        info!(role = %role.id, name, "repaired webmaster role");
    }
    if strip_global_denials(store, &role.id).await? {
        info!(role = %role.id, name, "removed global all.all denial for webmaster");
        repaired = true;
    }
    Ok(BootstrapReport { role, created: false, repaired })
}

/// Drop global-configuration `all.all` records for `role` that are not an
/// explicit allow. Returns whether anything was removed.
async fn strip_global_denials<S: DocumentStore + ?Sized>(store: &S, role: &NodeId) -> Result<bool> {
    let mut entries = store.fetch_global_permissions(&Component::All).await?;
    let mut changed = false;
    for entry in entries.iter_mut().filter(|e| &e.role == role) {
        let before = entry.permissions.len();
        entry
            .permissions
            .retain(|r| r.name != Action::All || r.status == Grant::Allow);
        changed |= entry.permissions.len() != before;
    }
    if changed {
        store.set_global_permissions(&Component::All, entries).await?;
    }
    Ok(changed)
}
