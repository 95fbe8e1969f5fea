//! Errors reported by [`Tree`][crate::ranked::Tree].

use thiserror::Error;

/// Why a tree operation was rejected. A rejected operation never changes the tree.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AvlError {
    /// `insert` was given a key that is already stored.
    #[error("key is already present in the tree")]
    DuplicateKey,
    /// `delete` was given a key that is not stored.
    #[error("key is not present in the tree")]
    KeyNotFound,
    /// `kth_largest` was asked for a rank outside `1..=len`.
    #[error("rank {rank} is out of range for a tree of {len} elements")]
    RankOutOfRange {
        /// The requested rank.
        rank: usize,
        /// How many elements the tree held.
        len: usize,
    },
}

/// A broken structural invariant found by [`Tree::validate`][crate::ranked::Tree::validate].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A key is not strictly between the keys bounding its subtree.
    #[error("keys are not in strictly ascending in-order sequence")]
    Unordered,
    /// A node's stored height disagrees with its children.
    #[error("stored height {found} but children imply {expected}")]
    HeightMismatch {
        /// `1 + max(left, right)`.
        expected: usize,
        /// The stored height.
        found: usize,
    },
    /// A node's children differ in height by more than one.
    #[error("balance factor {balance} is outside -1..=1")]
    Unbalanced {
        /// `height(right) - height(left)`.
        balance: isize,
    },
    /// A node's `right_count` is not the size of its right subtree.
    #[error("right count is {found} but the right subtree holds {expected} nodes")]
    RightCountMismatch {
        /// The counted size of the right subtree.
        expected: usize,
        /// The stored counter.
        found: usize,
    },
    /// The tree's element count is not the number of reachable nodes.
    #[error("tree reports {found} elements but {expected} nodes are reachable")]
    LenMismatch {
        /// The number of reachable nodes.
        expected: usize,
        /// The stored length.
        found: usize,
    },
}
