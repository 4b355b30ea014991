//! A scapegoat tree for Rust.
//!
//! This crate provides [`ScapegoatTree`], an ordered set built on a binary search tree that stores
//! no balance information in its nodes. Balance is restored lazily: an insertion that lands too deep
//! rebuilds the subtree of one ancestor (the scapegoat), and a tree that has shrunk enough through
//! deletions is rebuilt as a whole. Search, insertion and deletion run in O(log n) amortized time.
//!
//! # Example
//!
//! ```
//! use scapegoat_tree::ScapegoatTree;
//!
//! let mut tree = ScapegoatTree::with_alpha(0.7).unwrap();
//! for key in [20, 10, 30, 5, 11, 29, 40, 50, 1, 12] {
//!     tree.insert(key);
//! }
//!
//! assert!(tree.contains(&11));
//! assert_eq!(tree.len(), 10);
//!
//! // Deleting enough keys triggers a full rebuild.
//! for key in [50, 40, 30, 29] {
//!     tree.delete(&key);
//! }
//! assert_eq!(tree.max_len(), 7);
//! assert!(tree.is_alpha_weight_balanced());
//! ```
//!
//! # Features
//!
//! - **Tunable balance** - [`Alpha`] trades rebuild frequency for tree height
//! - **Pluggable algorithm** - the structural work goes through the [`Algorithm`] trait
//! - **Rebuild notifications** - [`ScapegoatTree::on_unbalanced`] registers listeners
//! - **`serde` support** - behind the `serde` feature, trees serialize as `{ alpha, max_len, keys }`
//!
//! # Implementation
//!
//! Nodes live in a [`NodeStore`](raw::NodeStore) arena and refer to each other by
//! [`NodeId`](raw::NodeId). Nodes carry no parent pointers; insertion records the ancestors it
//! passes in a [`Path`], which scapegoat discovery then walks back up.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod alpha;
mod error;
mod scapegoat_tree;

pub mod algorithm;
pub mod raw;

pub use algorithm::{Algorithm, Path, Scapegoat};
pub use alpha::Alpha;
pub use error::{Error, ErrorKind, Result};
pub use scapegoat_tree::{IntoIter, Iter, ListenerId, ScapegoatTree};
