/// Data model for the folder size tree.
///
/// Re-exports the arena-allocated tree structure and supporting types.
pub mod size;
pub mod size_node;
pub mod size_tree;

pub use size_node::{NodeIndex, SizeNode};
pub use size_tree::{SizeEntry, SizeTree};
