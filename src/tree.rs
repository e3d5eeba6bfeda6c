//! Document tree utility
//!
//! Operations over any collection of parent-referencing [`Document`]s:
//! root-to-node paths, nested tree construction, flattening with depth
//! annotations, unflattening (with placeholder ancestors for pruned parents)
//! and fractional-key sibling reordering.
//!
//! Every walk is an explicit work-list, so depth limits and cycle detection
//! are ordinary loop steps.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::document::{Document, Filter, NodeId, Sort};
use crate::error::{PermtreeError, Result};
use crate::store::{self, DocumentStore};

/// Which side of `over` a reordered node lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Immediately before `over`
    Before,
    /// Immediately after `over`
    After,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Before => -1.0,
            Direction::After => 1.0,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = PermtreeError;

    fn try_from(v: i64) -> Result<Self> {
        match v {
            -1 => Ok(Direction::Before),
            1 => Ok(Direction::After),
            other => Err(PermtreeError::invalid(format!("direction must be +1 or -1, got {}", other))),
        }
    }
}

/// A node of a materialized tree.
///
/// `doc` is None for a placeholder ancestor synthesized by [`unflatten_tree`]
/// (`hide` is set). `children` is None for nodes whose children were never
/// fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<D> {
    #[serde(flatten)]
    pub doc: Option<D>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hide: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode<D>>>,
}

impl<D> TreeNode<D> {
    pub fn is_placeholder(&self) -> bool {
        self.doc.is_none()
    }

    pub fn children(&self) -> &[TreeNode<D>] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// A flattened record: the document plus its distance from a root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode<D> {
    #[serde(flatten)]
    pub doc: D,
    pub depth: usize,
}

// ============================================================================
// Paths
// ============================================================================

/// Documents from the root down to `id`, inclusive, root-first
pub async fn chain_to_root<D, S>(store: &S, id: &NodeId) -> Result<Vec<D>>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    let mut chain = VecDeque::new();
    let mut seen = HashSet::new();
    let mut cur = Some(id.clone());
    while let Some(next) = cur {
        if !seen.insert(next.clone()) {
            return Err(PermtreeError::cycle(next));
        }
        let doc: D = store::get(store, &next).await?;
        cur = doc.parent().cloned();
        chain.push_front(doc);
    }
    Ok(chain.into())
}

/// Ids from the root down to `id`, inclusive, root-first
pub async fn path_to_root<D, S>(store: &S, id: &NodeId) -> Result<Vec<NodeId>>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    let chain: Vec<D> = chain_to_root(store, id).await?;
    Ok(chain.iter().map(|d| d.id().clone()).collect())
}

/// Ids of every ancestor of `id`, root-first, excluding `id` itself
pub async fn ancestors_of<D, S>(store: &S, id: &NodeId) -> Result<Vec<NodeId>>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    let mut path = path_to_root::<D, S>(store, id).await?;
    path.pop();
    Ok(path)
}

// ============================================================================
// Build / flatten / unflatten
// ============================================================================

struct Slot<D> {
    doc: Option<D>,
    parent: Option<usize>,
    children: Option<Vec<usize>>,
}

impl<D> Slot<D> {
    fn new(doc: Option<D>, parent: Option<usize>) -> Self {
        Slot { doc, parent, children: None }
    }
}

/// Materialize nested trees.
///
/// Starts from `seeds`, or from every root matching `filter` when None. Each
/// frontier node's direct children (matching `filter`, ordered by `sort`) are
/// fetched until none remain or `max_depth` is reached. Seeds are depth 0 and
/// nodes at `max_depth` get no children fetched (their `children` stays None).
pub async fn build_tree<D, S>(
    store: &S,
    seeds: Option<Vec<D>>,
    filter: &Filter,
    sort: &Sort,
    max_depth: Option<usize>,
) -> Result<Vec<TreeNode<D>>>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    let seeds = match seeds {
        Some(s) => s,
        None => store::children(store, None, filter, sort).await?,
    };

    let mut slots: Vec<Slot<D>> = Vec::new();
    let mut roots = Vec::with_capacity(seeds.len());
    let mut work = VecDeque::new();
    for seed in seeds {
        roots.push(slots.len());
        work.push_back((slots.len(), 0usize));
        slots.push(Slot::new(Some(seed), None));
    }

    while let Some((idx, depth)) = work.pop_front() {
        if max_depth.is_some_and(|m| depth >= m) {
            continue;
        }
        let Some(id) = slots[idx].doc.as_ref().map(|d| d.id().clone()) else {
            continue;
        };
        let kids: Vec<D> = store::children(store, Some(&id), filter, sort).await?;
        let mut ids = Vec::with_capacity(kids.len());
        for kid in kids {
            if on_branch(&slots, idx, kid.id()) {
                return Err(PermtreeError::cycle(kid.id()));
            }
            ids.push(slots.len());
            work.push_back((slots.len(), depth + 1));
            slots.push(Slot::new(Some(kid), Some(idx)));
        }
        slots[idx].children = Some(ids);
    }

    debug!(collection = D::COLLECTION, nodes = slots.len(), roots = roots.len(), "built tree");
    Ok(assemble(slots, &roots))
}

/// Whether `id` already appears on the branch ending at `idx`
fn on_branch<D: Document>(slots: &[Slot<D>], mut idx: usize, id: &NodeId) -> bool {
    loop {
        if slots[idx].doc.as_ref().is_some_and(|d| d.id() == id) {
            return true;
        }
        match slots[idx].parent {
            Some(p) => idx = p,
            None => return false,
        }
    }
}

/// Turn slot links into nested nodes (iterative post-order)
fn assemble<D>(slots: Vec<Slot<D>>, roots: &[usize]) -> Vec<TreeNode<D>> {
    let mut slots: Vec<Option<Slot<D>>> = slots.into_iter().map(Some).collect();
    let mut done: Vec<Option<TreeNode<D>>> = (0..slots.len()).map(|_| None).collect();
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&r| (r, false)).collect();

    while let Some((i, expanded)) = stack.pop() {
        if expanded {
            let Some(slot) = slots[i].take() else { continue };
            let children = slot
                .children
                .map(|ids| ids.iter().filter_map(|&c| done[c].take()).collect());
            done[i] = Some(TreeNode { hide: slot.doc.is_none(), doc: slot.doc, children });
        } else {
            stack.push((i, true));
            if let Some(Some(Slot { children: Some(ids), .. })) = slots.get(i) {
                stack.extend(ids.iter().rev().map(|&c| (c, false)));
            }
        }
    }
    roots.iter().filter_map(|&r| done[r].take()).collect()
}

/// Pre-order flattening: each parent is immediately followed by all of its
/// descendants before any sibling. Placeholders are dropped; their depth
/// still counts for the nodes below them.
pub fn flatten_tree<D>(forest: Vec<TreeNode<D>>) -> Vec<FlatNode<D>> {
    let mut out = Vec::new();
    let mut stack: Vec<(TreeNode<D>, usize)> = forest.into_iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        if let Some(children) = node.children {
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
        if let Some(doc) = node.doc {
            out.push(FlatNode { doc, depth });
        }
    }
    out
}

/// Rebuild nested trees from flattened records.
///
/// A record whose parent is in the set is attached to it. A record with no
/// parent is a root. A record whose parent is missing from the set but whose
/// recorded depth is above zero had its ancestors filtered out; it gets
/// anonymous `hide` placeholder ancestors so it keeps its depth. Consecutive
/// orphans of the same missing parent share one placeholder; an orphan of a
/// different missing parent gets a chain of its own. Fails with `CycleDetected` if
/// parents inside the set loop, `InvalidArgument` on duplicate ids.
pub fn unflatten_tree<D: Document>(flat: Vec<FlatNode<D>>) -> Result<Vec<TreeNode<D>>> {
    let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(flat.len());
    for (i, node) in flat.iter().enumerate() {
        if index.insert(node.doc.id().clone(), i).is_some() {
            return Err(PermtreeError::invalid(format!("duplicate id '{}'", node.doc.id())));
        }
    }

    let depths: Vec<usize> = flat.iter().map(|n| n.depth).collect();
    let real = flat.len();
    let mut slots: Vec<Slot<D>> = flat.into_iter().map(|n| Slot::new(Some(n.doc), None)).collect();
    let mut roots = Vec::new();
    // Slot open at each depth along the most recently placed branch
    let mut open: Vec<usize> = Vec::new();
    // Placeholder slot -> missing parent id it stands for
    let mut stands_for: HashMap<usize, NodeId> = HashMap::new();

    for i in 0..real {
        let depth = depths[i];
        let parent = slots[i].doc.as_ref().and_then(|d| d.parent()).cloned();
        match parent {
            Some(p) if index.contains_key(&p) => {
                let pi = index[&p];
                slots[i].parent = Some(pi);
                slots[pi].children.get_or_insert_with(Vec::new).push(i);
            }
            Some(p) if depth > 0 => {
                let reusable = open.get(depth - 1).copied().filter(|o| stands_for.get(o) == Some(&p));
                let holder = match reusable {
                    Some(o) => o,
                    None => {
                        let h = placeholder_chain(&mut slots, &mut roots, &mut open, depth);
                        stands_for.insert(h, p);
                        h
                    }
                };
                slots[i].parent = Some(holder);
                slots[holder].children.get_or_insert_with(Vec::new).push(i);
            }
            _ => roots.push(i),
        }
        open.truncate(depth);
        open.push(i);
    }

    // Nodes whose parents loop inside the set are unreachable from any root
    let mut reached = vec![false; slots.len()];
    let mut stack: Vec<usize> = roots.clone();
    while let Some(i) = stack.pop() {
        reached[i] = true;
        if let Some(ids) = &slots[i].children {
            stack.extend(ids.iter().copied());
        }
    }
    if let Some(i) = (0..real).find(|&i| !reached[i]) {
        let id = slots[i].doc.as_ref().map(|d| d.id().to_string()).unwrap_or_default();
        return Err(PermtreeError::cycle(id));
    }

    for slot in slots.iter_mut().take(real) {
        slot.children.get_or_insert_with(Vec::new);
    }
    trace!(records = real, placeholders = slots.len() - real, "unflattened tree");
    Ok(assemble(slots, &roots))
}

/// Fresh chain of `depth` placeholders rooted at a new forest root; returns
/// the deepest one
fn placeholder_chain<D>(slots: &mut Vec<Slot<D>>, roots: &mut Vec<usize>, open: &mut Vec<usize>, depth: usize) -> usize {
    open.clear();
    let mut above: Option<usize> = None;
    for _ in 0..depth {
        let h = slots.len();
        slots.push(Slot { doc: None, parent: above, children: Some(Vec::new()) });
        match above {
            Some(a) => slots[a].children.get_or_insert_with(Vec::new).push(h),
            None => roots.push(h),
        }
        open.push(h);
        above = Some(h);
    }
    // depth > 0, so the loop ran at least once
    above.unwrap_or_default()
}

// ============================================================================
// Reorder
// ============================================================================

/// Move `active` immediately before or after `over` (`direction` -1 / +1).
///
/// The rest of the collection is taken in its current order (ties in `order`
/// broken by id) and `active` is slotted in next to `over`, the fractional
/// key it would get being `over`'s rank ± 0.5. Every document of the
/// collection is then renumbered to its 0-based rank. Stored keys that tie
/// or are fractional therefore never misplace `active`. Returns the
/// collection in its final order.
///
/// Renumbering rewrites the whole collection and is not safe under concurrent
/// reorders of the same collection: callers must serialize reorders per
/// collection.
pub async fn reorder<D, S>(store: &S, active_id: &NodeId, over_id: &NodeId, direction: i64) -> Result<Vec<D>>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    let direction = Direction::try_from(direction)?;
    if active_id == over_id {
        return Err(PermtreeError::invalid(format!("cannot reorder '{}' relative to itself", active_id)));
    }
    let active: D = store::get(store, active_id).await?;

    let mut docs: Vec<D> = store::all::<D, S>(store, &Filter::new(), &Sort::by_order())
        .await?
        .into_iter()
        .filter(|d| d.id() != active_id)
        .collect();
    let pos = docs
        .iter()
        .position(|d| d.id() == over_id)
        .ok_or_else(|| PermtreeError::not_found(D::COLLECTION, over_id))?;
    let at = match direction {
        Direction::Before => pos,
        Direction::After => pos + 1,
    };
    debug!(
        collection = D::COLLECTION,
        active = %active_id,
        over = %over_id,
        ?direction,
        order = pos as f64 + direction.sign() / 2.0,
        "reordering"
    );
    docs.insert(at, active);
    write_ranks(store, docs).await
}

/// Rewrite every document's `order` to its 0-based rank
pub async fn renormalize<D, S>(store: &S) -> Result<Vec<D>>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    let all: Vec<D> = store::all(store, &Filter::new(), &Sort::by_order()).await?;
    write_ranks(store, all).await
}

/// Persist each document whose `order` differs from its index in `docs`
async fn write_ranks<D, S>(store: &S, mut all: Vec<D>) -> Result<Vec<D>>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    let mut rewritten = 0usize;
    for (rank, doc) in all.iter_mut().enumerate() {
        let rank = rank as f64;
        if doc.order() != rank {
            doc.set_order(rank);
            store::save(store, doc).await?;
            rewritten += 1;
        }
    }
    trace!(collection = D::COLLECTION, total = all.len(), rewritten, "renormalized order");
    Ok(all)
}
