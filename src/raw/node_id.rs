use core::fmt;
use core::num::NonZero;

#[cfg(test)]
type RawId = u16;
#[cfg(not(test))]
type RawId = u32;

/// Identifies a node slot inside a [`NodeStore`](super::NodeStore).
///
/// Ids are only meaningful for the store that produced them. A freed id may be handed out again by a
/// later allocation. `Option<NodeId>` has the same size as `NodeId`, so a child link costs no more
/// than the id itself.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(NonZero<RawId>);

impl NodeId {
    pub(crate) const MAX: usize = (RawId::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`NodeId::from_index()` - `index` > `NodeId::MAX`!");
        // `index + 1` is never zero and fits `RawId` after the assertion above.
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((index + 1) as RawId) {
            Some(id) => Self(id),
            None => unreachable!(),
        }
    }

    /// Returns the slot index this id refers to.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.index())
    }
}
