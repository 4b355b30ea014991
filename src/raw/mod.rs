//! Node storage and subtree measurements.
//!
//! These are the building blocks an [`Algorithm`](crate::Algorithm) works on. Most users only need
//! [`ScapegoatTree`](crate::ScapegoatTree); custom algorithms and hand-built fixtures use this module.

mod balance;
mod node_id;
mod store;

pub use balance::{is_alpha_weight_balanced, subtree_height, subtree_size};
pub use node_id::NodeId;
pub use store::{Node, NodeStore, Side};
