use alloc::vec::Vec;

use super::node_id::NodeId;

/// Which child slot of a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// The slot holding smaller keys.
    Left,
    /// The slot holding larger keys.
    Right,
}

impl Side {
    /// Returns the other side.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A binary tree cell: one key and two child links.
///
/// A node carries no balance bookkeeping. Every node is linked from exactly one child slot (or from
/// the tree's root slot), so the links form a tree without parent pointers.
#[derive(Clone, Debug)]
pub struct Node<K> {
    key: K,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl<K> Node<K> {
    /// Returns the node's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the left child.
    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Returns the right child.
    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Returns the child on `side`.
    #[inline]
    pub fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Slot storage for the nodes of one tree.
///
/// Nodes are addressed by [`NodeId`]. Freed slots are recycled by later allocations, so a rebuild
/// that re-links existing nodes never allocates.
#[derive(Clone, Debug)]
pub struct NodeStore<K> {
    slots: Vec<Option<Node<K>>>,
    free: Vec<NodeId>,
}

impl<K> Default for NodeStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> NodeStore<K> {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    /// Returns true if the store holds no live nodes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocates a childless node holding `key`.
    ///
    /// # Panics
    ///
    /// Panics if the store already holds the maximum number of nodes an id can address.
    pub fn alloc(&mut self, key: K) -> NodeId {
        let node = Node {
            key,
            left: None,
            right: None,
        };
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(node);
            id
        } else {
            assert!(
                self.slots.len() <= NodeId::MAX,
                "`NodeStore::alloc()` - store is at maximum capacity ({})",
                NodeId::MAX + 1
            );
            self.slots.push(Some(node));
            NodeId::from_index(self.slots.len() - 1)
        }
    }

    /// Allocates a node holding `key` with the given children.
    pub fn alloc_with(&mut self, key: K, left: Option<NodeId>, right: Option<NodeId>) -> NodeId {
        let id = self.alloc(key);
        self.set_left(id, left);
        self.set_right(id, right);
        id
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a live node of this store.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<K> {
        self.slots[id.index()].as_ref().expect("`NodeStore::get()` - `id` is invalid!")
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut Node<K> {
        self.slots[id.index()].as_mut().expect("`NodeStore::get_mut()` - `id` is invalid!")
    }

    /// Returns the key of `id`.
    #[inline]
    pub fn key(&self, id: NodeId) -> &K {
        &self.get(id).key
    }

    /// Returns the left child of `id`.
    #[inline]
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).left
    }

    /// Returns the right child of `id`.
    #[inline]
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).right
    }

    /// Returns the child of `id` on `side`.
    #[inline]
    pub fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self.get(id).child(side)
    }

    /// Points the left slot of `id` at `child`.
    #[inline]
    pub fn set_left(&mut self, id: NodeId, child: Option<NodeId>) {
        self.get_mut(id).left = child;
    }

    /// Points the right slot of `id` at `child`.
    #[inline]
    pub fn set_right(&mut self, id: NodeId, child: Option<NodeId>) {
        self.get_mut(id).right = child;
    }

    /// Points the `side` slot of `id` at `child`.
    #[inline]
    pub fn set_child(&mut self, id: NodeId, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.set_left(id, child),
            Side::Right => self.set_right(id, child),
        }
    }

    /// Returns the side of `parent` that links to `child`, if either does.
    #[inline]
    pub fn side_of(&self, parent: NodeId, child: NodeId) -> Option<Side> {
        let node = self.get(parent);
        if node.left == Some(child) {
            Some(Side::Left)
        } else if node.right == Some(child) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Stores `key` in `id` and returns the key it replaces.
    pub fn replace_key(&mut self, id: NodeId, key: K) -> K {
        core::mem::replace(&mut self.get_mut(id).key, key)
    }

    /// Releases the slot behind `id` and returns its key.
    ///
    /// The node's children are not touched; unlinking them is the caller's job.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a live node of this store.
    pub fn free(&mut self, id: NodeId) -> K {
        let node = self.slots[id.index()].take().expect("`NodeStore::free()` - `id` is invalid!");
        self.free.push(id);
        node.key
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
