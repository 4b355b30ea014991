//! The structural algorithms behind [`ScapegoatTree`](crate::ScapegoatTree).
//!
//! [`ScapegoatTree`](crate::ScapegoatTree) decides *when* to rebuild; an [`Algorithm`] decides *how*
//! to search, link, unlink and rebuild nodes. [`Scapegoat`] is the default implementation. Swapping in
//! another implementation (for instance a wrapper that counts rebuild work) changes nothing in the
//! tree's bookkeeping.

use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;

use smallvec::SmallVec;
use tracing::{debug, instrument};

use crate::alpha::Alpha;
use crate::error::{Error, Result};
use crate::raw::{NodeId, NodeStore, Side, subtree_size};

/// Ancestors visited while descending to an insertion point, root first, parent on top.
pub type Path = SmallVec<[NodeId; 32]>;

/// Search, insertion, deletion and reconstruction over a [`NodeStore`].
///
/// The four required methods are the structural primitives. The provided methods build scapegoat
/// discovery and subtree reconstruction on top of them and may be overridden as a whole.
pub trait Algorithm<K: Ord> {
    /// Returns the node holding `key` in the subtree rooted at `root`.
    fn search<Q>(&self, store: &NodeStore<K>, root: Option<NodeId>, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord;

    /// Links the detached `node` into the tree behind `root`.
    ///
    /// Every node compared against is pushed onto `path`, so on success the new node's parent is on
    /// top. Returns false, leaving `node` detached, if a node with an equal key already exists.
    fn insert(&self, store: &mut NodeStore<K>, root: &mut Option<NodeId>, node: NodeId, path: &mut Path) -> bool;

    /// Removes `key` from the tree behind `root` and frees exactly one node.
    ///
    /// Returns false if `key` is absent.
    fn delete<Q>(&self, store: &mut NodeStore<K>, root: &mut Option<NodeId>, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord;

    /// Re-links `nodes[start..=end]`, sorted by key, into a minimum-height tree and returns its root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if `start > end` or `end` is out of bounds.
    fn rebuild_from_range(&self, store: &mut NodeStore<K>, nodes: &[NodeId], start: usize, end: usize)
    -> Result<NodeId>;

    /// Pops ancestors off `path`, innermost first, until one is too small for the inserted node's
    /// depth below it, and returns that ancestor with its subtree size.
    ///
    /// `path` must be the path recorded by the insertion that just happened. The ancestors above the
    /// scapegoat stay on `path`, so afterwards its parent (if any) is on top.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPath`] if `path` is empty, and [`Error::ScapegoatNotFound`] if no
    /// ancestor qualifies.
    ///
    /// # Panics
    ///
    /// Panics if an entry of `path` is not the parent of the entry above it.
    fn find_scapegoat(&self, store: &NodeStore<K>, path: &mut Path, alpha: Alpha) -> Result<(usize, NodeId)> {
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }

        // `below` is the ancestor just left behind; `None` stands for the inserted node itself.
        let mut below: Option<NodeId> = None;
        let mut ascended = 1;
        let mut depth = 1;

        while let Some(ancestor) = path.pop() {
            let total = match below {
                None => subtree_size(store, Some(ancestor)),
                Some(child) => {
                    let side = store
                        .side_of(ancestor, child)
                        .expect("`Algorithm::find_scapegoat()` - `path` is invalid!");
                    1 + ascended + subtree_size(store, store.child(ancestor, side.opposite()))
                }
            };

            if alpha.exceeds_depth_bound(depth, total) {
                return Ok((total, ancestor));
            }

            below = Some(ancestor);
            ascended = total;
            depth += 1;
        }

        Err(Error::ScapegoatNotFound)
    }

    /// Appends the nodes of the subtree rooted at `root` to `out` in ascending key order.
    fn flatten(&self, store: &NodeStore<K>, root: Option<NodeId>, out: &mut Vec<NodeId>) {
        let mut stack: SmallVec<[NodeId; 32]> = SmallVec::new();
        let mut current = root;

        loop {
            while let Some(id) = current {
                stack.push(id);
                current = store.left(id);
            }
            let Some(id) = stack.pop() else {
                break;
            };
            out.push(id);
            current = store.right(id);
        }
    }

    /// Rebuilds the subtree rooted at `root` into a minimum-height tree and returns its new root.
    ///
    /// The caller must point the slot that held `root` at the returned node.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`rebuild_from_range`](Self::rebuild_from_range).
    #[instrument(level = "trace", skip_all)]
    fn rebuild_subtree(&self, store: &mut NodeStore<K>, root: NodeId) -> Result<NodeId> {
        let mut nodes = Vec::new();
        self.flatten(store, Some(root), &mut nodes);
        debug!(size = nodes.len(), "rebuilding subtree");
        self.rebuild_from_range(store, &nodes, 0, nodes.len() - 1)
    }
}

/// The default [`Algorithm`]: plain BST descent, predecessor promotion on deletion, and upper-median
/// reconstruction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Scapegoat;

impl<K: Ord> Algorithm<K> for Scapegoat {
    fn search<Q>(&self, store: &NodeStore<K>, root: Option<NodeId>, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = root;
        while let Some(id) = current {
            current = match key.cmp(store.key(id).borrow()) {
                Ordering::Less => store.left(id),
                Ordering::Greater => store.right(id),
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    fn insert(&self, store: &mut NodeStore<K>, root: &mut Option<NodeId>, node: NodeId, path: &mut Path) -> bool {
        let Some(mut current) = *root else {
            *root = Some(node);
            return true;
        };

        loop {
            path.push(current);
            let side = match store.key(node).cmp(store.key(current)) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return false,
            };
            match store.child(current, side) {
                Some(child) => current = child,
                None => {
                    store.set_child(current, side, Some(node));
                    return true;
                }
            }
        }
    }

    fn delete<Q>(&self, store: &mut NodeStore<K>, root: &mut Option<NodeId>, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut parent: Option<(NodeId, Side)> = None;
        let mut current = *root;

        let target = loop {
            let Some(id) = current else {
                return false;
            };
            let side = match key.cmp(store.key(id).borrow()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => break id,
            };
            parent = Some((id, side));
            current = store.child(id, side);
        };

        match (store.left(target), store.right(target)) {
            (Some(left), Some(_)) => {
                // The in-order predecessor is the rightmost node of the left subtree; it has no right
                // child, so it unlinks like a node with at most one child.
                let mut slot = (target, Side::Left);
                let mut predecessor = left;
                while let Some(right) = store.right(predecessor) {
                    slot = (predecessor, Side::Right);
                    predecessor = right;
                }
                let promoted = splice_out(store, root, Some(slot), predecessor);
                store.replace_key(target, promoted);
            }
            _ => {
                splice_out(store, root, parent, target);
            }
        }
        true
    }

    fn rebuild_from_range(
        &self,
        store: &mut NodeStore<K>,
        nodes: &[NodeId],
        start: usize,
        end: usize,
    ) -> Result<NodeId> {
        let invalid = Error::InvalidRange {
            start,
            end,
            len: nodes.len(),
        };
        if start > end || end >= nodes.len() {
            return Err(invalid);
        }
        link_balanced(store, &nodes[start..=end]).ok_or(invalid)
    }
}

// Replaces `node` (at most one child) with its child in `parent`'s slot, or in `root` when `parent`
// is `None`, then frees it.
fn splice_out<K>(store: &mut NodeStore<K>, root: &mut Option<NodeId>, parent: Option<(NodeId, Side)>, node: NodeId) -> K {
    debug_assert!(store.left(node).is_none() || store.right(node).is_none());
    let child = store.left(node).or(store.right(node));
    match parent {
        Some((parent, side)) => store.set_child(parent, side, child),
        None => *root = child,
    }
    store.free(node)
}

// The upper median of each range becomes the subtree root, so left halves are never smaller than
// right halves and the height is ceil(log2(n + 1)).
fn link_balanced<K>(store: &mut NodeStore<K>, nodes: &[NodeId]) -> Option<NodeId> {
    let (left, rest) = nodes.split_at(nodes.len() / 2);
    let (&root, right) = rest.split_first()?;
    let left = link_balanced(store, left);
    let right = link_balanced(store, right);
    store.set_left(root, left);
    store.set_right(root, right);
    Some(root)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::raw::{is_alpha_weight_balanced, subtree_height};
    use alloc::format;
    use alloc::string::String;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // Renders a subtree as `key(left,right)`, leaves as `key`, missing children as `_`.
    fn render(store: &NodeStore<i32>, root: Option<NodeId>) -> String {
        let Some(id) = root else {
            return "_".into();
        };
        let node = store.get(id);
        if node.left().is_none() && node.right().is_none() {
            format!("{}", node.key())
        } else {
            format!("{}({},{})", node.key(), render(store, node.left()), render(store, node.right()))
        }
    }

    fn keys(store: &NodeStore<i32>, root: Option<NodeId>) -> Vec<i32> {
        let mut nodes = Vec::new();
        Scapegoat.flatten(store, root, &mut nodes);
        nodes.into_iter().map(|id| *store.key(id)).collect()
    }

    // Inserts `first` then `rest` without any rebalancing; returns the path of the last insertion.
    fn grow(store: &mut NodeStore<i32>, root: &mut Option<NodeId>, first: i32, rest: &[i32]) -> Path {
        let mut path = Path::new();
        let node = store.alloc(first);
        assert!(Scapegoat.insert(store, root, node, &mut path));
        for &key in rest {
            path.clear();
            let node = store.alloc(key);
            Scapegoat.insert(store, root, node, &mut path);
        }
        path
    }

    // 1(-1,2)
    fn small(store: &mut NodeStore<i32>) -> Option<NodeId> {
        let left = store.alloc(-1);
        let right = store.alloc(2);
        Some(store.alloc_with(1, Some(left), Some(right)))
    }

    #[test]
    fn search_finds_left_and_right() {
        let mut store = NodeStore::new();
        let root = small(&mut store);
        let root_id = root.unwrap();

        assert_eq!(Scapegoat.search(&store, root, &-1), store.left(root_id));
        assert_eq!(Scapegoat.search(&store, root, &2), store.right(root_id));
        assert_eq!(Scapegoat.search(&store, root, &1), root);
    }

    #[test]
    fn search_misses() {
        let mut store = NodeStore::new();
        let right = store.alloc(2);
        let root = Some(store.alloc_with(1, None, Some(right)));
        assert_eq!(Scapegoat.search(&store, root, &-1), None);

        let left = store.alloc(-1);
        let root = Some(store.alloc_with(1, Some(left), None));
        assert_eq!(Scapegoat.search(&store, root, &2), None);
        assert_eq!(Scapegoat.search(&store, None, &2), None);
    }

    #[test]
    fn delete_leaves() {
        let mut store = NodeStore::new();
        let mut root = small(&mut store);

        assert!(Scapegoat.delete(&mut store, &mut root, &-1));
        assert_eq!(render(&store, root), "1(_,2)");
        assert!(!Scapegoat.delete(&mut store, &mut root, &-2));

        assert!(Scapegoat.delete(&mut store, &mut root, &2));
        assert_eq!(render(&store, root), "1");
        assert!(!Scapegoat.delete(&mut store, &mut root, &3));
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    #[case::left_child(-2, "1(-2,2)")]
    #[case::right_child(0, "1(0,2)")]
    fn delete_with_one_child_promotes_child(#[case] child: i32, #[case] expected: &str) {
        let mut store = NodeStore::new();
        let grandchild = store.alloc(child);
        let (left, right) = if child < -1 { (Some(grandchild), None) } else { (None, Some(grandchild)) };
        let inner = store.alloc_with(-1, left, right);
        let two = store.alloc(2);
        let mut root = Some(store.alloc_with(1, Some(inner), Some(two)));

        assert!(Scapegoat.delete(&mut store, &mut root, &-1));
        assert_eq!(render(&store, root), expected);
        assert_eq!(subtree_size(&store, root), 3);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn delete_left_with_two_children_promotes_predecessor() {
        let mut store = NodeStore::new();
        let mut root = None;
        grow(&mut store, &mut root, 3, &[1, 4, 2, -1, 0, -2]);
        assert_eq!(render(&store, root), "3(1(-1(-2,0),2),4)");

        assert!(Scapegoat.delete(&mut store, &mut root, &1));
        assert_eq!(render(&store, root), "3(0(-1(-2,_),2),4)");
        assert_eq!(subtree_size(&store, root), 6);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn delete_right_with_two_children_promotes_predecessor() {
        let mut store = NodeStore::new();
        let mut root = None;
        grow(&mut store, &mut root, 3, &[1, 10, 11, 8, 9, 7]);
        assert_eq!(render(&store, root), "3(1,10(8(7,9),11))");

        assert!(Scapegoat.delete(&mut store, &mut root, &10));
        assert_eq!(render(&store, root), "3(1,9(8(7,_),11))");
        assert_eq!(subtree_size(&store, root), 6);
    }

    #[test]
    fn delete_predecessor_that_is_the_left_child() {
        let mut store = NodeStore::new();
        let mut root = None;
        grow(&mut store, &mut root, 5, &[3, 8, 1]);

        assert!(Scapegoat.delete(&mut store, &mut root, &5));
        assert_eq!(render(&store, root), "3(1,8)");
    }

    #[test]
    fn delete_root_rewrites_the_root_slot() {
        let mut store = NodeStore::new();
        let mut root = None;
        grow(&mut store, &mut root, 1, &[2]);

        assert!(Scapegoat.delete(&mut store, &mut root, &1));
        assert_eq!(render(&store, root), "2");
        assert!(Scapegoat.delete(&mut store, &mut root, &2));
        assert_eq!(root, None);
        assert!(store.is_empty());
        assert!(!Scapegoat.delete(&mut store, &mut root, &2));
    }

    #[test]
    fn insert_smaller_goes_left() {
        let mut store = NodeStore::new();
        let mut root = Some(store.alloc(3));
        let node = store.alloc(1);
        let mut path = Path::new();

        assert!(Scapegoat.insert(&mut store, &mut root, node, &mut path));
        assert_eq!(store.left(root.unwrap()), Some(node));
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn insert_bigger_goes_right() {
        let mut store = NodeStore::new();
        let mut root = Some(store.alloc(3));
        let node = store.alloc(4);
        let mut path = Path::new();

        assert!(Scapegoat.insert(&mut store, &mut root, node, &mut path));
        assert_eq!(store.right(root.unwrap()), Some(node));
        assert_eq!(path.as_slice(), [root.unwrap()]);
    }

    #[test]
    fn insert_duplicate_is_rejected() {
        let mut store = NodeStore::new();
        let mut root = Some(store.alloc(3));
        let node = store.alloc(3);
        let mut path = Path::new();

        assert!(!Scapegoat.insert(&mut store, &mut root, node, &mut path));
        assert_eq!(store.left(root.unwrap()), None);
        assert_eq!(store.right(root.unwrap()), None);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn insert_into_empty_becomes_root() {
        let mut store = NodeStore::new();
        let mut root = None;
        let node = store.alloc(3);
        let mut path = Path::new();

        assert!(Scapegoat.insert(&mut store, &mut root, node, &mut path));
        assert_eq!(root, Some(node));
        assert!(path.is_empty());
    }

    #[test]
    fn find_scapegoat_rejects_empty_path() {
        let store: NodeStore<i32> = NodeStore::new();
        let result = Scapegoat.find_scapegoat(&store, &mut Path::new(), Alpha::DEFAULT);
        assert_eq!(result, Err(Error::EmptyPath));
    }

    #[rstest]
    #[case(8, &[1, 13, 10, 20, 19, 22, 29], 0.57, 8, 8)]
    #[case(3, &[2, 1, 5, 6, -1], 0.5, 2, 3)]
    fn find_scapegoat_in_unbalanced_tree(
        #[case] first: i32,
        #[case] rest: &[i32],
        #[case] alpha: f64,
        #[case] expected: i32,
        #[case] expected_size: usize,
    ) {
        let mut store = NodeStore::new();
        let mut root = None;
        let mut path = grow(&mut store, &mut root, first, rest);

        let (size, scapegoat) = Scapegoat.find_scapegoat(&store, &mut path, Alpha::new(alpha).unwrap()).unwrap();

        assert_eq!(*store.key(scapegoat), expected);
        assert_eq!(size, expected_size);
        assert_eq!(subtree_size(&store, Some(scapegoat)), size);
    }

    #[test]
    fn find_scapegoat_leaves_parent_on_top() {
        let mut store = NodeStore::new();
        let mut root = None;
        let mut path = grow(&mut store, &mut root, 3, &[2, 1, 5, 6, -1]);

        let (_, scapegoat) = Scapegoat.find_scapegoat(&store, &mut path, Alpha::DEFAULT).unwrap();

        assert_eq!(path.as_slice(), [root.unwrap()]);
        assert_eq!(store.side_of(root.unwrap(), scapegoat), Some(Side::Left));
    }

    #[test]
    #[should_panic(expected = "`Algorithm::find_scapegoat()` - `path` is invalid!")]
    fn find_scapegoat_rejects_broken_parent_chain() {
        let mut store = NodeStore::new();
        let mut root = None;
        grow(&mut store, &mut root, 3, &[2, 5, 1]);
        let two = store.left(root.unwrap()).unwrap();
        let five = store.right(root.unwrap()).unwrap();

        // 2 is not the parent of 5; alpha 1.0 never stops the walk early.
        let mut path: Path = [two, five].into_iter().collect();
        let _ = Scapegoat.find_scapegoat(&store, &mut path, Alpha::new(1.0).unwrap());
    }

    #[rstest]
    #[case(19, &[10, 8, 13, 1, 22, 20, 29], 0.57)]
    #[case(3, &[2, 1, 5, 6], 0.5)]
    fn find_scapegoat_in_balanced_tree_fails(#[case] first: i32, #[case] rest: &[i32], #[case] alpha: f64) {
        let mut store = NodeStore::new();
        let mut root = None;
        let mut path = grow(&mut store, &mut root, first, rest);

        let result = Scapegoat.find_scapegoat(&store, &mut path, Alpha::new(alpha).unwrap());

        assert_eq!(result, Err(Error::ScapegoatNotFound));
        assert!(path.is_empty());
    }

    #[rstest]
    #[case(8, &[1, 13, 10, 20, 19, 22, 29])]
    #[case(3, &[2, 1, 5, 6, -1])]
    fn flatten_is_in_order(#[case] first: i32, #[case] rest: &[i32]) {
        let mut store = NodeStore::new();
        let mut root = None;
        grow(&mut store, &mut root, first, rest);

        let mut expected: Vec<i32> = rest.to_vec();
        expected.push(first);
        expected.sort_unstable();

        assert_eq!(keys(&store, root), expected);
    }

    #[test]
    fn rebuild_from_range_reproduces_fixture() {
        let mut store = NodeStore::new();
        let nodes: Vec<NodeId> = [-1, 1, 2, 3, 5, 6].into_iter().map(|key| store.alloc(key)).collect();

        let root = Scapegoat.rebuild_from_range(&mut store, &nodes, 0, nodes.len() - 1).unwrap();

        assert_eq!(render(&store, Some(root)), "3(1(-1,2),6(5,_))");
        assert_eq!(subtree_size(&store, Some(root)), nodes.len());
        assert_eq!(subtree_height(&store, Some(root)), 3);
    }

    #[test]
    fn rebuild_from_range_over_a_sub_range() {
        let mut store = NodeStore::new();
        let nodes: Vec<NodeId> = (1..=7).map(|key| store.alloc(key)).collect();

        let root = Scapegoat.rebuild_from_range(&mut store, &nodes, 2, 4).unwrap();

        assert_eq!(render(&store, Some(root)), "4(3,5)");
    }

    #[test]
    fn rebuild_from_range_rejects_invalid_ranges() {
        let mut store: NodeStore<i32> = NodeStore::new();
        assert_eq!(
            Scapegoat.rebuild_from_range(&mut store, &[], 1, 0),
            Err(Error::InvalidRange { start: 1, end: 0, len: 0 })
        );
        assert_eq!(
            Scapegoat.rebuild_from_range(&mut store, &[], 0, 0),
            Err(Error::InvalidRange { start: 0, end: 0, len: 0 })
        );

        let node = store.alloc(1);
        assert_eq!(
            Scapegoat.rebuild_from_range(&mut store, &[node], 0, 1),
            Err(Error::InvalidRange { start: 0, end: 1, len: 1 })
        );
    }

    #[test]
    fn rebuild_subtree_balances_chain() {
        let mut store = NodeStore::new();
        let mut root = None;
        grow(&mut store, &mut root, 3, &[2, 5, 1, 6, -1]);
        assert_eq!(render(&store, root), "3(2(1(-1,_),_),5(_,6))");

        let rebuilt = Scapegoat.rebuild_subtree(&mut store, root.unwrap()).unwrap();

        assert!(is_alpha_weight_balanced(&store, Some(rebuilt), Alpha::DEFAULT));
        assert_eq!(*store.key(rebuilt), 3);
        assert_eq!(store.left(rebuilt).map(|id| *store.key(id)), Some(1));
        assert_eq!(keys(&store, Some(rebuilt)), [-1, 1, 2, 3, 5, 6]);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn flatten_then_rebuild_keeps_every_node() {
        let mut store = NodeStore::new();
        let mut root = None;
        grow(&mut store, &mut root, 0, &(1..100).collect::<Vec<_>>());
        assert_eq!(subtree_height(&store, root), 100);

        let mut before = Vec::new();
        Scapegoat.flatten(&store, root, &mut before);
        let rebuilt = Scapegoat.rebuild_from_range(&mut store, &before, 0, before.len() - 1).unwrap();

        let mut after = Vec::new();
        Scapegoat.flatten(&store, Some(rebuilt), &mut after);
        assert_eq!(before, after);
        assert_eq!(subtree_height(&store, Some(rebuilt)), 7);
    }
}
