use alloc::boxed::Box;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;

use tracing::{debug, trace};

use crate::algorithm::{Algorithm, Path, Scapegoat};
use crate::alpha::Alpha;
use crate::error::{Error, Result};
use crate::raw::{NodeId, NodeStore, is_alpha_weight_balanced, subtree_height, subtree_size};

mod iter;
mod observer;
#[cfg(feature = "serde")]
mod serde;

pub use iter::{IntoIter, Iter};
pub use observer::ListenerId;

use observer::Listeners;

/// An ordered set based on a scapegoat tree.
///
/// A scapegoat tree is a binary search tree that keeps no balance information in its nodes. It
/// remembers only how many keys it holds and the most it has held since it was last rebuilt
/// ([`max_len`](Self::max_len)). When an insertion lands deeper than
/// `log(max_len) / log(1 / alpha)`, the deepest ancestor whose subtree is too small for that depth
/// (the *scapegoat*) is rebuilt into a perfectly balanced subtree. When a deletion removes the root,
/// or shrinks the set to `alpha * max_len` keys or fewer, the whole tree is rebuilt. Search,
/// insertion and deletion are O(log n) amortized.
///
/// The structural work is delegated to an [`Algorithm`], [`Scapegoat`] by default; the tree itself
/// only keeps the counters and decides when a rebuild is due. Every time it decides so, the listeners
/// registered with [`on_unbalanced`](Self::on_unbalanced) are called.
///
/// It is a logic error for a key to be modified in such a way that its ordering relative to any
/// other key, as determined by the [`Ord`] trait, changes while it is in the set.
///
/// # Examples
///
/// ```
/// use scapegoat_tree::ScapegoatTree;
///
/// let mut tree = ScapegoatTree::new();
/// assert!(tree.insert(1));
/// assert!(tree.insert(-1));
/// assert!(tree.insert(2));
/// assert!(!tree.insert(2));
///
/// assert!(tree.contains(&-1));
/// assert_eq!(tree.len(), 3);
///
/// assert!(tree.delete(&1));
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [-1, 2]);
/// ```
pub struct ScapegoatTree<K, A = Scapegoat> {
    store: NodeStore<K>,
    root: Option<NodeId>,
    len: usize,
    max_len: usize,
    alpha: Alpha,
    algorithm: A,
    listeners: Listeners,
}

impl<K> ScapegoatTree<K> {
    /// Makes a new, empty tree with the default alpha of 0.5.
    ///
    /// # Examples
    ///
    /// ```
    /// use scapegoat_tree::ScapegoatTree;
    ///
    /// let tree: ScapegoatTree<i32> = ScapegoatTree::new();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.alpha().get(), 0.5);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self::from_raw(NodeStore::new(), None, 0, Alpha::DEFAULT, Scapegoat)
    }

    /// Makes a new, empty tree with the given alpha.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlpha`] if `alpha` is outside `[0.5, 1.0]`.
    pub fn with_alpha(alpha: f64) -> Result<Self> {
        Ok(Self::from_raw(NodeStore::new(), None, 0, Alpha::new(alpha)?, Scapegoat))
    }

    /// Makes a tree holding the single key `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlpha`] if `alpha` is outside `[0.5, 1.0]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scapegoat_tree::ScapegoatTree;
    ///
    /// let tree = ScapegoatTree::with_key(10, 0.8).unwrap();
    /// assert_eq!(tree.len(), 1);
    /// assert_eq!(tree.max_len(), 1);
    /// ```
    pub fn with_key(key: K, alpha: f64) -> Result<Self> {
        let alpha = Alpha::new(alpha)?;
        let mut store = NodeStore::new();
        let root = store.alloc(key);
        Ok(Self::from_raw(store, Some(root), 1, alpha, Scapegoat))
    }
}

impl<K, A> ScapegoatTree<K, A> {
    const fn from_raw(store: NodeStore<K>, root: Option<NodeId>, len: usize, alpha: Alpha, algorithm: A) -> Self {
        Self {
            store,
            root,
            len,
            max_len: len,
            alpha,
            algorithm,
            listeners: Listeners::new(),
        }
    }

    /// Makes a new, empty tree that delegates its structural work to `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlpha`] if `alpha` is outside `[0.5, 1.0]`.
    pub fn with_algorithm(alpha: f64, algorithm: A) -> Result<Self> {
        Ok(Self::from_raw(NodeStore::new(), None, 0, Alpha::new(alpha)?, algorithm))
    }

    /// Adopts a hand-built node structure rooted at `root`.
    ///
    /// The structure is taken as is, without rebalancing; its size becomes both
    /// [`len`](Self::len) and [`max_len`](Self::max_len). The keys must already be in search-tree
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlpha`] if `alpha` is outside `[0.5, 1.0]`, and
    /// [`Error::DetachedNodes`] if `store` holds nodes that `root` does not reach.
    ///
    /// # Examples
    ///
    /// ```
    /// use scapegoat_tree::ScapegoatTree;
    /// use scapegoat_tree::algorithm::Scapegoat;
    /// use scapegoat_tree::raw::NodeStore;
    ///
    /// let mut store = NodeStore::new();
    /// let left = store.alloc(1);
    /// let right = store.alloc(11);
    /// let root = store.alloc_with(10, Some(left), Some(right));
    ///
    /// let tree = ScapegoatTree::from_parts(store, Some(root), 0.8, Scapegoat).unwrap();
    /// assert_eq!(tree.len(), 3);
    /// assert_eq!(tree.max_len(), 3);
    /// ```
    pub fn from_parts(store: NodeStore<K>, root: Option<NodeId>, alpha: f64, algorithm: A) -> Result<Self> {
        let alpha = Alpha::new(alpha)?;
        let reachable = subtree_size(&store, root);
        if reachable != store.len() {
            return Err(Error::DetachedNodes {
                reachable,
                stored: store.len(),
            });
        }
        Ok(Self::from_raw(store, root, reachable, alpha, algorithm))
    }

    /// Returns the number of keys in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the largest [`len`](Self::len) reached since the tree was last fully rebuilt or
    /// cleared.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Returns the current balance factor.
    #[must_use]
    pub const fn alpha(&self) -> Alpha {
        self.alpha
    }

    /// Returns the algorithm the tree delegates to.
    pub const fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// Returns the root node, if any.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node storage, for inspecting the tree's shape.
    pub const fn store(&self) -> &NodeStore<K> {
        &self.store
    }

    /// Changes the balance factor.
    ///
    /// The tree is not rebalanced; the new factor applies from the next insertion or deletion on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlpha`], leaving the current factor in place, if `alpha` is outside
    /// `[0.5, 1.0]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scapegoat_tree::ScapegoatTree;
    ///
    /// let mut tree: ScapegoatTree<i32> = ScapegoatTree::new();
    /// assert!(tree.tune(1.1).is_err());
    /// tree.tune(0.7).unwrap();
    /// assert_eq!(tree.alpha().get(), 0.7);
    /// ```
    pub fn tune(&mut self, alpha: f64) -> Result<()> {
        self.alpha = Alpha::new(alpha)?;
        Ok(())
    }

    /// Removes every key. Registered listeners are kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.root = None;
        self.len = 0;
        self.max_len = 0;
    }

    /// Returns true if every node keeps both child subtrees within [`alpha`](Self::alpha) of its own
    /// size. An empty tree is balanced.
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn is_alpha_weight_balanced(&self) -> bool {
        is_alpha_weight_balanced(&self.store, self.root, self.alpha)
    }

    /// Returns the number of nodes on the longest root-to-leaf path, zero when empty.
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn height(&self) -> usize {
        subtree_height(&self.store, self.root)
    }

    /// Registers `listener` to be called every time the tree decides a rebuild is due.
    ///
    /// Listeners are called synchronously, in registration order, before the rebuild runs. They
    /// cannot prevent it.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// use scapegoat_tree::ScapegoatTree;
    ///
    /// let rebuilds = Arc::new(AtomicUsize::new(0));
    /// let mut tree = ScapegoatTree::with_key(3, 0.5).unwrap();
    /// let counter = Arc::clone(&rebuilds);
    /// tree.on_unbalanced(move || {
    ///     counter.fetch_add(1, Ordering::Relaxed);
    /// });
    ///
    /// tree.extend([2, 5, 1, 6]);
    /// assert_eq!(rebuilds.load(Ordering::Relaxed), 0);
    /// tree.insert(-1);
    /// assert_eq!(rebuilds.load(Ordering::Relaxed), 1);
    /// ```
    pub fn on_unbalanced<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut() + Send + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    /// Unregisters a listener. Returns false if `id` was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Gets an iterator that visits the keys in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use scapegoat_tree::ScapegoatTree;
    ///
    /// let tree = ScapegoatTree::from([3, 1, 2]);
    /// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(&self.store, self.root, self.len)
    }
}

impl<K: Ord, A: Algorithm<K>> ScapegoatTree<K, A> {
    // Links already sorted, distinct keys into a minimum-height tree.
    pub(crate) fn from_sorted(keys: Vec<K>, alpha: Alpha, max_len: usize, algorithm: A) -> Result<Self> {
        let mut store = NodeStore::new();
        let nodes: Vec<NodeId> = keys.into_iter().map(|key| store.alloc(key)).collect();
        let root = match nodes.len() {
            0 => None,
            len => Some(algorithm.rebuild_from_range(&mut store, &nodes, 0, len - 1)?),
        };
        let mut tree = Self::from_raw(store, root, nodes.len(), alpha, algorithm);
        tree.max_len = max_len.max(tree.len);
        Ok(tree)
    }

    /// Returns a reference to the key in the tree equal to `key`, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use scapegoat_tree::ScapegoatTree;
    ///
    /// let tree = ScapegoatTree::from([1, 2]);
    /// assert_eq!(tree.search(&1), Some(&1));
    /// assert_eq!(tree.search(&3), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn search<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let id = self.algorithm.search(&self.store, self.root, key)?;
        Some(self.store.key(id))
    }

    /// Returns true if the tree contains a key equal to `key`.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).is_some()
    }

    /// Adds `key` to the tree.
    ///
    /// Returns false, leaving the tree untouched, if an equal key is already present. If the new key
    /// lands deeper than the tree's depth bound, the listeners are notified and the scapegoat's
    /// subtree is rebuilt before this returns.
    ///
    /// # Panics
    ///
    /// Panics if the algorithm fails to find or rebuild a scapegoat after the depth bound was
    /// exceeded. [`Scapegoat`] always succeeds.
    ///
    /// # Complexity
    ///
    /// O(log n) amortized
    pub fn insert(&mut self, key: K) -> bool {
        let node = self.store.alloc(key);
        let mut path = Path::new();
        if !self.algorithm.insert(&mut self.store, &mut self.root, node, &mut path) {
            self.store.free(node);
            return false;
        }

        self.len += 1;
        self.max_len = self.max_len.max(self.len);

        if self.alpha.exceeds_depth_bound(path.len(), self.max_len) {
            trace!(depth = path.len(), max_len = self.max_len, "insertion exceeded the depth bound");
            self.listeners.notify();
            if let Err(error) = self.rebuild_scapegoat(&mut path) {
                panic!("`ScapegoatTree::insert()` - {error}");
            }
        }
        true
    }

    fn rebuild_scapegoat(&mut self, path: &mut Path) -> Result<()> {
        let (size, scapegoat) = self.algorithm.find_scapegoat(&self.store, path, self.alpha)?;
        debug!(size, depth = path.len(), "rebuilding scapegoat subtree");

        // Discovery leaves the scapegoat's parent on top of the path.
        let parent = path.last().copied();
        let rebuilt = self.algorithm.rebuild_subtree(&mut self.store, scapegoat)?;
        match parent {
            Some(parent) if self.store.left(parent) == Some(scapegoat) => self.store.set_left(parent, Some(rebuilt)),
            Some(parent) => self.store.set_right(parent, Some(rebuilt)),
            None => self.root = Some(rebuilt),
        }
        Ok(())
    }

    /// Removes the key equal to `key` from the tree.
    ///
    /// Returns false if no such key is present. If the key was at the root, or the tree shrinks to
    /// `alpha * max_len` keys or fewer, the listeners are notified, the whole tree is rebuilt and
    /// [`max_len`](Self::max_len) drops to the current length.
    ///
    /// # Panics
    ///
    /// Panics if the algorithm fails to rebuild the tree. [`Scapegoat`] always succeeds.
    ///
    /// # Complexity
    ///
    /// O(log n) amortized
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let at_root = self.root.is_some_and(|root| key.cmp(self.store.key(root).borrow()).is_eq());
        if !self.algorithm.delete(&mut self.store, &mut self.root, key) {
            return false;
        }
        self.len -= 1;

        if at_root || self.alpha.permits(self.len, self.max_len) {
            debug!(len = self.len, max_len = self.max_len, at_root, "rebuilding tree after deletion");
            self.listeners.notify();
            if let Some(root) = self.root {
                match self.algorithm.rebuild_subtree(&mut self.store, root) {
                    Ok(rebuilt) => self.root = Some(rebuilt),
                    Err(error) => panic!("`ScapegoatTree::delete()` - {error}"),
                }
            }
            self.max_len = self.len;
        }
        true
    }
}

impl<K, A: Default> Default for ScapegoatTree<K, A> {
    fn default() -> Self {
        Self::from_raw(NodeStore::new(), None, 0, Alpha::DEFAULT, A::default())
    }
}

impl<K: fmt::Debug, A> fmt::Debug for ScapegoatTree<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, A> PartialEq for ScapegoatTree<K, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Eq, A> Eq for ScapegoatTree<K, A> {}

impl<'a, K, A> IntoIterator for &'a ScapegoatTree<K, A> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K: Ord, A: Algorithm<K>> IntoIterator for ScapegoatTree<K, A> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        let mut order = Vec::with_capacity(self.len);
        self.algorithm.flatten(&self.store, self.root, &mut order);
        IntoIter::new(self.store, order)
    }
}

impl<K: Ord, A: Algorithm<K>> Extend<K> for ScapegoatTree<K, A> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K: Ord + Copy + 'a, A: Algorithm<K>> Extend<&'a K> for ScapegoatTree<K, A> {
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<K: Ord, A: Algorithm<K> + Default> FromIterator<K> for ScapegoatTree<K, A> {
    /// Builds a perfectly balanced tree; of several equal keys the first one is kept.
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut keys: Vec<K> = iter.into_iter().collect();
        keys.sort();
        keys.dedup();
        match Self::from_sorted(keys, Alpha::DEFAULT, 0, A::default()) {
            Ok(tree) => tree,
            Err(error) => panic!("`ScapegoatTree::from_iter()` - {error}"),
        }
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for ScapegoatTree<K> {
    /// Converts a `[K; N]` into a `ScapegoatTree<K>`.
    ///
    /// ```
    /// use scapegoat_tree::ScapegoatTree;
    ///
    /// let tree = ScapegoatTree::from([1, 2, 3, 4]);
    /// assert_eq!(tree.len(), 4);
    /// ```
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}
