//! Subtree measurements. Nothing here is cached: every call walks the subtree it is given.

use smallvec::SmallVec;

use super::node_id::NodeId;
use super::store::NodeStore;
use crate::alpha::Alpha;

/// Returns the number of nodes in the subtree rooted at `root` (zero for `None`).
///
/// O(subtree size).
pub fn subtree_size<K>(store: &NodeStore<K>, root: Option<NodeId>) -> usize {
    let mut stack: SmallVec<[NodeId; 32]> = SmallVec::new();
    stack.extend(root);

    let mut size = 0;
    while let Some(id) = stack.pop() {
        size += 1;
        let node = store.get(id);
        stack.extend(node.left());
        stack.extend(node.right());
    }
    size
}

/// Returns the number of nodes on the longest downward path from `root` (zero for `None`).
pub fn subtree_height<K>(store: &NodeStore<K>, root: Option<NodeId>) -> usize {
    let mut stack: SmallVec<[(NodeId, usize); 32]> = SmallVec::new();
    stack.extend(root.map(|id| (id, 1)));

    let mut height = 0;
    while let Some((id, depth)) = stack.pop() {
        height = height.max(depth);
        let node = store.get(id);
        stack.extend(node.left().map(|child| (child, depth + 1)));
        stack.extend(node.right().map(|child| (child, depth + 1)));
    }
    height
}

/// Returns true if every node below `root` keeps both child subtrees within `alpha` of its own size.
///
/// An empty subtree is balanced. The walk is post-order with an explicit stack, so arbitrarily deep
/// subtrees are fine.
pub fn is_alpha_weight_balanced<K>(store: &NodeStore<K>, root: Option<NodeId>, alpha: Alpha) -> bool {
    // `(id, true)` marks a node whose children have already been measured.
    let mut pending: SmallVec<[(NodeId, bool); 32]> = SmallVec::new();
    let mut sizes: SmallVec<[usize; 32]> = SmallVec::new();
    pending.extend(root.map(|id| (id, false)));

    while let Some((id, measured)) = pending.pop() {
        let node = store.get(id);
        if !measured {
            pending.push((id, true));
            pending.extend(node.right().map(|child| (child, false)));
            pending.extend(node.left().map(|child| (child, false)));
            continue;
        }

        // The left subtree finishes first, so its size sits below the right one.
        let right = if node.right().is_some() { sizes.pop().unwrap_or_default() } else { 0 };
        let left = if node.left().is_some() { sizes.pop().unwrap_or_default() } else { 0 };
        let total = 1 + left + right;
        if !(alpha.permits(left, total) && alpha.permits(right, total)) {
            return false;
        }
        sizes.push(total);
    }
    true
}
