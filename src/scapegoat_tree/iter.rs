use alloc::vec;
use core::fmt;
use core::iter::FusedIterator;

use smallvec::SmallVec;

use crate::raw::{NodeId, NodeStore};

/// An iterator over the keys of a [`ScapegoatTree`](crate::ScapegoatTree) in ascending order.
///
/// This `struct` is created by the [`iter`](crate::ScapegoatTree::iter) method on
/// [`ScapegoatTree`](crate::ScapegoatTree). It holds at most one pending node per level of the tree.
///
/// # Examples
///
/// ```
/// use scapegoat_tree::ScapegoatTree;
///
/// let tree = ScapegoatTree::from([3, 1, 2]);
/// let mut iter = tree.iter();
/// assert_eq!(iter.next(), Some(&1));
/// assert_eq!(iter.len(), 2);
/// ```
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K> {
    store: &'a NodeStore<K>,
    stack: SmallVec<[NodeId; 32]>,
    remaining: usize,
}

impl<'a, K> Iter<'a, K> {
    pub(crate) fn new(store: &'a NodeStore<K>, root: Option<NodeId>, len: usize) -> Self {
        let mut iter = Self {
            store,
            stack: SmallVec::new(),
            remaining: len,
        };
        iter.descend_left(root);
        iter
    }

    fn descend_left(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            self.stack.push(id);
            current = self.store.left(id);
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let id = self.stack.pop()?;
        self.descend_left(self.store.right(id));
        self.remaining = self.remaining.saturating_sub(1);
        Some(self.store.key(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Iter<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An owning iterator over the keys of a [`ScapegoatTree`](crate::ScapegoatTree) in ascending order.
///
/// This `struct` is created by the `into_iter` method on [`ScapegoatTree`](crate::ScapegoatTree)
/// (provided by the [`IntoIterator`] trait).
pub struct IntoIter<K> {
    store: NodeStore<K>,
    order: vec::IntoIter<NodeId>,
}

impl<K> IntoIter<K> {
    pub(crate) fn new(store: NodeStore<K>, order: vec::Vec<NodeId>) -> Self {
        Self {
            store,
            order: order.into_iter(),
        }
    }
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.order.next().map(|id| self.store.free(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K> DoubleEndedIterator for IntoIter<K> {
    fn next_back(&mut self) -> Option<K> {
        self.order.next_back().map(|id| self.store.free(id))
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}

impl<K> FusedIterator for IntoIter<K> {}
