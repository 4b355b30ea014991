use core::fmt;

use crate::error::{Error, Result};

/// The balance factor of a [`ScapegoatTree`](crate::ScapegoatTree).
///
/// Alpha bounds how lopsided any subtree may become: a node of subtree size `n` keeps each child at
/// most `alpha * n` nodes, and no node sits deeper than `log(max_len) / log(1 / alpha)`. Lower values
/// keep the tree shallower at the price of more frequent rebuilds; `1.0` never rebuilds on insertion.
///
/// # Examples
///
/// ```
/// use scapegoat_tree::Alpha;
///
/// let alpha = Alpha::new(0.7).unwrap();
/// assert_eq!(alpha.get(), 0.7);
/// assert!(Alpha::new(0.4).is_err());
/// assert!(Alpha::new(1.1).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct Alpha(f64);

impl Alpha {
    /// The smallest accepted balance factor.
    pub const MIN: f64 = 0.5;
    /// The largest accepted balance factor.
    pub const MAX: f64 = 1.0;
    /// The balance factor used by [`ScapegoatTree::new`](crate::ScapegoatTree::new).
    pub const DEFAULT: Self = Self(0.5);

    /// Validates `alpha` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlpha`] if `alpha` is NaN or outside `[0.5, 1.0]`.
    pub fn new(alpha: f64) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&alpha) {
            Ok(Self(alpha))
        } else {
            Err(Error::InvalidAlpha(alpha))
        }
    }

    /// Returns the raw balance factor.
    #[inline]
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Returns the deepest depth (in edges) a node may have in an alpha-height-balanced subtree of
    /// `size` nodes: `log(size) / log(1 / alpha)`.
    ///
    /// For `alpha == 1.0` the bound is infinite (NaN for a single node), so no depth exceeds it.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn depth_bound(self, size: usize) -> f64 {
        (size as f64).ln() / (1.0 / self.0).ln()
    }

    /// Returns true if `depth` is deeper than [`depth_bound`](Self::depth_bound) allows for `size`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn exceeds_depth_bound(self, depth: usize, size: usize) -> bool {
        depth as f64 > self.depth_bound(size)
    }

    /// Returns true if a child subtree of `child` nodes is acceptable under a node whose subtree
    /// holds `total` nodes.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn permits(self, child: usize, total: usize) -> bool {
        child as f64 <= self.0 * total as f64
    }
}

impl Default for Alpha {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for Alpha {
    type Error = Error;

    fn try_from(alpha: f64) -> Result<Self> {
        Self::new(alpha)
    }
}

impl From<Alpha> for f64 {
    fn from(alpha: Alpha) -> Self {
        alpha.0
    }
}

impl fmt::Display for Alpha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
