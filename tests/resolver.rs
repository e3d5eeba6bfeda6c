//! Role and user permission resolution tests
//!
//! These tests verify root-to-role folding, stickiness of deny, the
//! within-level merge of local and global-configuration settings, the
//! inheritance-only mode and the multi-role user merge.

mod common;

use common::{id, set_global, store_with};
use permtree::{
    Action, Component, Grant, PermissionDefinitions, PermissionRecord, PermtreeError, Resolver, Role, User,
};

fn edit() -> (Component, Action) {
    (Component::Article, Action::Edit)
}

// ============================================================================
// Inheritance along the chain
// ============================================================================

/// R0 allows article.edit, R1 denies it, R2 says nothing
#[tokio::test]
async fn deny_is_sticky_through_descendants() {
    let s = store_with(vec![
        Role::new("r0", "Root").with_permission("article", "edit", true),
        Role::new("r1", "Child").with_parent("r0").with_permission("article", "edit", false),
        Role::new("r2", "Grandchild").with_parent("r1"),
    ])
    .await;
    let defs = PermissionDefinitions::default();
    let r = Resolver::new(&s, &defs);
    let (c, a) = edit();

    let map = r.resolve_role_permissions(&id("r2"), false).await.unwrap();
    assert_eq!(map.get(&c, &a), Grant::Deny);
    let map = r.resolve_role_permissions(&id("r0"), false).await.unwrap();
    assert_eq!(map.get(&c, &a), Grant::Allow);
}

#[tokio::test]
async fn deny_at_root_cannot_be_reallowed() {
    let s = store_with(vec![
        Role::new("r0", "Root").with_permission("article", "delete", false),
        Role::new("r1", "Child").with_parent("r0").with_permission("article", "delete", true),
    ])
    .await;
    let defs = PermissionDefinitions::default();
    let map = Resolver::new(&s, &defs).resolve_role_permissions(&id("r1"), false).await.unwrap();
    assert_eq!(map.get(&Component::Article, &Action::Delete), Grant::Deny);
}

#[tokio::test]
async fn allow_flows_down_until_overridden() {
    let s = store_with(vec![
        Role::new("r0", "Root").with_permission("tag", "create", true),
        Role::new("r1", "Child").with_parent("r0"),
        Role::new("r2", "Grandchild").with_parent("r1"),
    ])
    .await;
    let defs = PermissionDefinitions::default();
    let map = Resolver::new(&s, &defs).resolve_role_permissions(&id("r2"), false).await.unwrap();
    assert_eq!(map.get(&Component::Tag, &Action::Create), Grant::Allow);
    assert_eq!(map.get(&Component::Tag, &Action::Delete), Grant::Inherit);
}

// ============================================================================
// Local and global sources
// ============================================================================

/// R1 allows article.edit locally, global configuration denies it for R1
#[tokio::test]
async fn local_and_global_merge_within_level() {
    let s = store_with(vec![
        Role::new("r0", "Root"),
        Role::new("r1", "Child").with_parent("r0").with_permission("article", "edit", true),
    ])
    .await;
    set_global(&s, "article", "r1", vec![PermissionRecord::new("edit", false)]).await;

    let defs = PermissionDefinitions::default();
    let map = Resolver::new(&s, &defs).resolve_role_permissions(&id("r1"), false).await.unwrap();
    let (c, a) = edit();
    assert_eq!(map.get(&c, &a), Grant::Deny);
}

#[tokio::test]
async fn global_allow_fills_missing_local_setting() {
    let s = store_with(vec![
        Role::new("r0", "Root").with_permission("article", "publish", Option::<bool>::None),
        Role::new("r1", "Child").with_parent("r0"),
    ])
    .await;
    set_global(&s, "article", "r0", vec![PermissionRecord::new("publish", true)]).await;
    // Entries for other roles are ignored
    set_global(&s, "article", "elsewhere", vec![PermissionRecord::new("publish", false)]).await;

    let defs = PermissionDefinitions::default();
    let map = Resolver::new(&s, &defs).resolve_role_permissions(&id("r1"), false).await.unwrap();
    assert_eq!(map.get(&Component::Article, &Action::Publish), Grant::Allow);
}

// ============================================================================
// Inheritance-only mode
// ============================================================================

#[tokio::test]
async fn inheritance_only_skips_own_level() {
    let s = store_with(vec![
        Role::new("r0", "Root").with_permission("user", "read", true),
        Role::new("r1", "Child")
            .with_parent("r0")
            .with_permission("article", "edit", true)
            .with_permission("user", "read", false),
    ])
    .await;
    set_global(&s, "category", "r1", vec![PermissionRecord::new("edit", true)]).await;

    let defs = PermissionDefinitions::default();
    let r = Resolver::new(&s, &defs);

    let own = r.resolve_role_permissions(&id("r1"), false).await.unwrap();
    assert_eq!(own.get(&Component::Article, &Action::Edit), Grant::Allow);
    assert_eq!(own.get(&Component::User, &Action::Read), Grant::Deny);
    assert_eq!(own.get(&Component::Category, &Action::Edit), Grant::Allow);

    let inherited = r.resolve_role_permissions(&id("r1"), true).await.unwrap();
    assert_eq!(inherited.get(&Component::Article, &Action::Edit), Grant::Inherit);
    assert_eq!(inherited.get(&Component::User, &Action::Read), Grant::Allow);
    assert_eq!(inherited.get(&Component::Category, &Action::Edit), Grant::Inherit);

    // A root has nothing to inherit
    let root = r.resolve_role_permissions(&id("r0"), true).await.unwrap();
    assert!(root.is_empty());
}

// ============================================================================
// Single component and errors
// ============================================================================

#[tokio::test]
async fn resolve_single_component() {
    let s = store_with(vec![Role::new("r0", "Root")
        .with_permission("all", "all", true)
        .with_permission("article", "edit", false)])
    .await;
    let defs = PermissionDefinitions::default();
    let map = Resolver::new(&s, &defs)
        .resolve_role_component(&id("r0"), &Component::All, false)
        .await
        .unwrap();
    assert_eq!(map.get(&Component::All, &Action::All), Grant::Allow);
    assert!(map.component(&Component::Article).is_none());
}

#[tokio::test]
async fn unknown_components_are_carried_through() {
    let s = store_with(vec![Role::new("r0", "Root").with_permission("widgets", "spin", true)]).await;
    let defs = PermissionDefinitions::default();
    let map = Resolver::new(&s, &defs).resolve_role_permissions(&id("r0"), false).await.unwrap();
    assert_eq!(
        map.get(&Component::Unknown("widgets".into()), &Action::Unknown("spin".into())),
        Grant::Allow
    );
}

#[tokio::test]
async fn unknown_global_components_are_carried_through() {
    let s = store_with(vec![Role::new("r0", "Root"), Role::new("r1", "Child").with_parent("r0")]).await;
    set_global(&s, "widgets", "r0", vec![PermissionRecord::new("spin", true)]).await;
    set_global(&s, "gadgets", "r1", vec![PermissionRecord::new("spin", false)]).await;

    let defs = PermissionDefinitions::default();
    let r = Resolver::new(&s, &defs);
    let (widgets, gadgets, spin) = (
        Component::Unknown("widgets".into()),
        Component::Unknown("gadgets".into()),
        Action::Unknown("spin".into()),
    );

    let map = r.resolve_role_permissions(&id("r1"), false).await.unwrap();
    assert_eq!(map.get(&widgets, &spin), Grant::Allow);
    assert_eq!(map.get(&gadgets, &spin), Grant::Deny);

    let inherited = r.resolve_role_permissions(&id("r1"), true).await.unwrap();
    assert_eq!(inherited.get(&widgets, &spin), Grant::Allow);
    assert_eq!(inherited.get(&gadgets, &spin), Grant::Inherit);
}

#[tokio::test]
async fn missing_ancestor_is_not_found() {
    let s = store_with(vec![Role::new("r1", "Child").with_parent("gone")]).await;
    let defs = PermissionDefinitions::default();
    let r = Resolver::new(&s, &defs);
    let e = r.resolve_role_permissions(&id("r1"), false).await.unwrap_err();
    assert_eq!(e, PermtreeError::not_found("roles", "gone"));
    let e = r.resolve_role_permissions(&id("nobody"), true).await.unwrap_err();
    assert_eq!(e, PermtreeError::not_found("roles", "nobody"));
}

// ============================================================================
// Users holding several roles
// ============================================================================

#[tokio::test]
async fn user_deny_wins_regardless_of_role_order() {
    let s = store_with(vec![
        Role::new("allow", "Allow").with_permission("article", "edit", true),
        Role::new("deny", "Deny").with_permission("article", "edit", false),
    ])
    .await;
    let defs = PermissionDefinitions::default();
    let r = Resolver::new(&s, &defs);
    let (c, a) = edit();

    for roles in [vec![id("allow"), id("deny")], vec![id("deny"), id("allow")]] {
        let map = r.resolve_user_permissions(&User::new("u", roles)).await.unwrap();
        assert_eq!(map.get(&c, &a), Grant::Deny);
    }
}

#[tokio::test]
async fn user_allow_against_absent_either_order() {
    let s = store_with(vec![
        Role::new("allow", "Allow").with_permission("article", "edit", true),
        Role::new("silent", "Silent"),
    ])
    .await;
    let defs = PermissionDefinitions::default();
    let r = Resolver::new(&s, &defs);
    let (c, a) = edit();

    let first = r
        .resolve_user_permissions(&User::new("u", vec![id("allow"), id("silent")]))
        .await
        .unwrap();
    let second = r
        .resolve_user_permissions(&User::new("u", vec![id("silent"), id("allow")]))
        .await
        .unwrap();
    assert_eq!(first.get(&c, &a), Grant::Allow);
    assert_eq!(second.get(&c, &a), Grant::Allow);
}

#[tokio::test]
async fn user_without_roles_resolves_empty() {
    let s = store_with(Vec::<Role>::new()).await;
    let defs = PermissionDefinitions::default();
    let map = Resolver::new(&s, &defs)
        .resolve_user_permissions(&User::new("u", vec![]))
        .await
        .unwrap();
    assert!(map.is_empty());
}
