use thiserror::Error;

/// A specialized [`Result`](core::result::Result) for scapegoat tree operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by [`ScapegoatTree`](crate::ScapegoatTree) and [`Algorithm`](crate::Algorithm)
/// implementations.
///
/// Every variant is a broken precondition on the caller's side. Missing keys and duplicate
/// insertions are not errors; they are reported through `Option` and `bool` results.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// The balance factor is outside `[0.5, 1.0]`.
    #[error("alpha must be within [0.5, 1.0], got {0}")]
    InvalidAlpha(f64),

    /// Scapegoat discovery was handed an empty ancestor path.
    #[error("the ancestor path must not be empty")]
    EmptyPath,

    /// A rebuild was requested over an empty or out-of-bounds range.
    #[error("invalid rebuild range {start}..={end} for {len} nodes")]
    InvalidRange {
        /// First index of the requested range.
        start: usize,
        /// Last index (inclusive) of the requested range.
        end: usize,
        /// Number of nodes available.
        len: usize,
    },

    /// A node store handed to the tree holds nodes that the root does not reach.
    #[error("node store holds {stored} nodes but only {reachable} are reachable from the root")]
    DetachedNodes {
        /// Nodes reachable from the root.
        reachable: usize,
        /// Nodes allocated in the store.
        stored: usize,
    },

    /// The ancestor path was exhausted without finding a scapegoat.
    #[error("scapegoat node wasn't found, the tree should be unbalanced")]
    ScapegoatNotFound,
}

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// An argument was out of its accepted domain.
    InvalidArgument,
    /// The structure was not in the state the operation requires.
    InvalidState,
}

impl Error {
    /// Returns the broad classification of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use scapegoat_tree::{Alpha, ErrorKind};
    ///
    /// let error = Alpha::new(1.1).unwrap_err();
    /// assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAlpha(_) | Error::EmptyPath | Error::InvalidRange { .. } | Error::DetachedNodes { .. } => {
                ErrorKind::InvalidArgument
            }
            Error::ScapegoatNotFound => ErrorKind::InvalidState,
        }
    }
}
