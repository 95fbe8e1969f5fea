//! This crate exposes an AVL tree augmented for order-statistic queries.
//!
//! ## Binary Search Tree
//!
//! A Binary Search Tree is a data structure supporting operations to
//! insert, find, and delete stored records. BSTs are typically defined
//! recursively using the notion of a `Node`. A `Node` stores a key, a value
//! and sometimes child `Node`s. The most important invariants of a BST are:
//!
//! 1. For every `Node` in a BST, all the `Node`s in its left subtree have a
//!    key less than its own key.
//! 2. For every `Node` in a BST, all the `Node`s in its right subtree have a
//!    key greater than its own key.
//!
//! Searching takes `O(height)`. An AVL tree keeps the heights of every
//! `Node`'s two subtrees within one of each other by rotating after each
//! insert and delete, which limits the height to `O(lg N)`.
//!
//! ## Rank queries
//!
//! Every `Node` additionally counts how many `Node`s live in its right
//! subtree. That is enough to answer "which key is the k-th largest?" by a
//! single walk from the root, so [`Tree::kth_largest`] runs in `O(lg N)` as
//! well.
//!
//! ```
//! use rank_avl::Tree;
//!
//! let mut tree = Tree::new();
//! for key in [15, 10, 20, 17, 5, 3, 4, 22] {
//!     tree.insert(key, key.to_string()).unwrap();
//! }
//!
//! assert_eq!(tree.kth_largest(1).unwrap().0, &22);
//! assert_eq!(tree.kth_largest(3).unwrap().0, &17);
//!
//! tree.delete(&17).unwrap();
//! assert_eq!(tree.kth_largest(3).unwrap().0, &15);
//! ```

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod error;
pub mod ranked;

pub use error::{AvlError, InvariantViolation};
pub use ranked::Tree;
