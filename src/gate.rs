//! Permission gate: the authorization check used by the routing layer
//!
//! Fail-closed: anything short of a resolved, explicit allow is a denial,
//! and any error during resolution is a denial.

use tracing::{debug, warn};

use crate::algebra::PermissionMap;
use crate::bootstrap::{ensure_webmaster, BootstrapReport};
use crate::config::Config;
use crate::document::NodeId;
use crate::error::Result;
use crate::models::User;
use crate::permission::{Action, Component};
use crate::resolver::Resolver;
use crate::store::DocumentStore;

/// Who is asking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Role(NodeId),
    User(User),
}

impl Actor {
    /// Roles the actor holds, in merge order
    pub fn role_ids(&self) -> &[NodeId] {
        match self {
            Actor::Role(id) => std::slice::from_ref(id),
            Actor::User(user) => &user.roles,
        }
    }
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Actor::User(user)
    }
}

/// Authorization entry point owning the store and configuration
pub struct PermissionGate<S> {
    store: S,
    config: Config,
}

impl<S: DocumentStore> PermissionGate<S> {
    pub fn new(store: S, config: Config) -> Self {
        PermissionGate { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> Resolver<'_, S> {
        Resolver::new(&self.store, &self.config.definitions)
    }

    /// Restore the Webmaster role invariant; call once at startup
    pub async fn ensure_invariant(&self) -> Result<BootstrapReport> {
        ensure_webmaster(&self.store, &self.config).await
    }

    /// Effective settings of a role, see [`Resolver::resolve_role_permissions`]
    pub async fn resolve_role_permissions(&self, role_id: &NodeId, inheritance_only: bool) -> Result<PermissionMap> {
        self.resolver().resolve_role_permissions(role_id, inheritance_only).await
    }

    /// Effective settings of any actor
    pub async fn resolve_actor(&self, actor: &Actor) -> Result<PermissionMap> {
        match actor {
            Actor::Role(id) => self.resolve_role_permissions(id, false).await,
            Actor::User(user) => self.resolver().resolve_user_permissions(user).await,
        }
    }

    /// Typed check: `InvalidArgument` for names outside the known permission
    /// set, `NotFound`/`CycleDetected` from resolution, otherwise whether the
    /// resolved setting is exactly allow.
    pub async fn check(&self, actor: &Actor, component: &Component, action: &Action) -> Result<bool> {
        self.config.definitions.validate(component, action)?;

        let resolver = self.resolver();
        for role_id in actor.role_ids() {
            let all = resolver.resolve_role_component(role_id, &Component::All, false).await?;
            if all.is_allowed(&Component::All, &Action::All) {
                debug!(role = %role_id, %component, %action, "allowed by universal grant");
                return Ok(true);
            }
        }

        let allowed = self.resolve_actor(actor).await?.is_allowed(component, action);
        debug!(roles = actor.role_ids().len(), %component, %action, allowed, "permission check");
        Ok(allowed)
    }

    /// Whether `actor` may perform `action` on `component`. Never errors:
    /// failures are logged and denied.
    pub async fn is_permitted(&self, actor: &Actor, component: &Component, action: &Action) -> bool {
        match self.check(actor, component, action).await {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!(error = %e, %component, %action, "permission check failed, denying");
                false
            }
        }
    }
}
