//! Hierarchical comments: flat parent-pointer storage, nested reads.

mod manager;
mod tree;

pub use manager::CommentTreeManager;
pub use tree::{depth_of, subtree_ids, CommentTree, Iter, TreeError};
