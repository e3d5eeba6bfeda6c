//! LMDB-backed store tests

mod common;

use common::{id, init_tracing, insert, orders, set_global};
use permtree::{
    build_tree, reorder, Action, Component, DocumentStore, Filter, LmdbStore, PermissionDefinitions,
    PermissionRecord, Resolver, Role, Sort, Tag,
};
use tempfile::TempDir;

fn open() -> (TempDir, LmdbStore) {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = LmdbStore::open(dir.path()).unwrap();
    (dir, store)
}

#[tokio::test]
async fn persist_and_fetch() {
    let (_dir, s) = open();
    insert(&s, vec![Tag::new("t1", "Rust"), Tag::new("t2", "Go").with_parent("t1")]).await;

    let doc = s.fetch_by_id("tags", &id("t2")).await.unwrap().unwrap();
    assert_eq!(doc["name"], "Go");
    assert_eq!(doc["parent"], "t1");
    assert!(s.fetch_by_id("tags", &id("t3")).await.unwrap().is_none());
    // Same id, other collection
    assert!(s.fetch_by_id("categories", &id("t1")).await.unwrap().is_none());

    let roots = s.fetch_children("tags", None, &Filter::new(), &Sort::by_order()).await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["id"], "t1");
}

#[tokio::test]
async fn tree_and_reorder_through_lmdb() {
    let (_dir, s) = open();
    insert(
        &s,
        vec![
            Tag::new("a", "A").with_order(0.0),
            Tag::new("b", "B").with_order(1.0),
            Tag::new("c", "C").with_order(2.0),
            Tag::new("a1", "A1").with_parent("a").with_order(3.0),
        ],
    )
    .await;

    let forest = build_tree::<Tag, _>(&s, None, &Filter::new(), &Sort::by_order(), None).await.unwrap();
    assert_eq!(forest.len(), 3);
    assert_eq!(forest[0].children().len(), 1);

    reorder::<Tag, _>(&s, &id("c"), &id("a"), -1).await.unwrap();
    assert_eq!(
        orders::<Tag, _>(&s).await,
        vec![("c".into(), 0.0), ("a".into(), 1.0), ("b".into(), 2.0), ("a1".into(), 3.0)]
    );
}

#[tokio::test]
async fn globals_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let s = LmdbStore::open(dir.path()).unwrap();
        insert(&s, vec![Role::new("r0", "Root")]).await;
        set_global(&s, "article", "r0", vec![PermissionRecord::new("edit", true)]).await;
    }

    let s = LmdbStore::open(dir.path()).unwrap();
    assert_eq!(s.global_components().await.unwrap(), vec![Component::Article]);
    let entries = s.fetch_global_permissions(&Component::Article).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].role, id("r0"));

    let defs = PermissionDefinitions::default();
    let map = Resolver::new(&s, &defs).resolve_role_permissions(&id("r0"), false).await.unwrap();
    assert!(map.is_allowed(&Component::Article, &Action::Edit));
}

#[tokio::test]
async fn clear_all_empties_store() {
    let (_dir, s) = open();
    insert(&s, vec![Tag::new("t1", "Rust")]).await;
    set_global(&s, "tag", "r0", vec![PermissionRecord::new("edit", true)]).await;

    s.clear_all().unwrap();
    assert!(s.global_components().await.unwrap().is_empty());
    assert!(s.fetch_all("tags", &Filter::new(), &Sort::by_order()).await.unwrap().is_empty());
    assert!(s.fetch_global_permissions(&Component::Tag).await.unwrap().is_empty());
}
