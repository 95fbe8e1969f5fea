//! An AVL tree whose nodes also count the size of their right subtree. The extra counter lets
//! [`Tree::kth_largest`] and [`Tree::rank_of`] walk a single root-to-node path instead of
//! traversing the whole tree.
//!
//! Keys are unique. Inserting a key that is already present is rejected rather than overwriting
//! the stored value, and deleting a key that is absent is rejected too. Either way the tree is
//! left exactly as it was.
//!
//! # Examples
//!
//! ```
//! use rank_avl::{AvlError, Tree};
//!
//! let mut tree = Tree::new();
//!
//! tree.insert(10, "ten").unwrap();
//! tree.insert(20, "twenty").unwrap();
//! tree.insert(30, "thirty").unwrap();
//!
//! // Keys are unique.
//! assert_eq!(tree.insert(10, "TEN"), Err(AvlError::DuplicateKey));
//! assert_eq!(tree.get(&10), Some(&"ten"));
//!
//! // Rank 1 is the largest key.
//! assert_eq!(tree.kth_largest(1), Ok((&30, &"thirty")));
//! assert_eq!(tree.rank_of(&10), Some(3));
//!
//! // Deleting hands back the value.
//! assert_eq!(tree.delete(&20), Ok("twenty"));
//! assert_eq!(tree.delete(&20), Err(AvlError::KeyNotFound));
//! assert_eq!(tree.len(), 2);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use log::{debug, trace};

use crate::error::{AvlError, InvariantViolation};

mod iter;

pub use iter::Iter;

/// A child slot. `None` is the empty subtree, which has height 0 and size 0.
type Link<K, V> = Option<Box<Node<K, V>>>;

/// A self-balancing Binary Search Tree (specifically, an AVL tree) that supports rank queries.
#[derive(Clone)]
pub struct Tree<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for Tree<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Draws the shape of the tree, one key per line. The left child is listed before the right
/// child and a missing child is drawn as `*`.
///
/// ```
/// use rank_avl::Tree;
///
/// let mut tree = Tree::new();
/// tree.insert(1, ()).unwrap();
/// tree.insert(2, ()).unwrap();
///
/// assert_eq!(tree.to_string(), "1\n├─ *\n└─ 2\n");
/// ```
impl<K, V> fmt::Display for Tree<K, V>
where
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => {
                writeln!(f, "{}", root.key)?;
                root.draw_children(f, "")
            }
            None => writeln!(f, "*"),
        }
    }
}

impl<K, V> Tree<K, V> {
    /// Generate a new, empty `Tree`.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// How many keys are stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree stores no keys at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every key from the tree.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// The height of the tree. An empty tree has height 0 and a single node has height 1.
    pub fn height(&self) -> usize {
        height(&self.root)
    }

    /// Inserts the given value into the tree stored at the given key.
    ///
    /// # Errors
    ///
    /// [`AvlError::DuplicateKey`] if the key is already present. The stored value is not
    /// replaced.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_avl::{AvlError, Tree};
    ///
    /// let mut tree = Tree::new();
    ///
    /// assert_eq!(tree.insert(1, 2), Ok(()));
    /// assert_eq!(tree.insert(1, 3), Err(AvlError::DuplicateKey));
    /// assert_eq!(tree.get(&1), Some(&2));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<(), AvlError>
    where
        K: Ord,
    {
        if let Err(err) = Node::insert(&mut self.root, key, value) {
            debug!("insert rejected: {err}");
            return Err(err);
        }
        self.len += 1;

        if cfg!(test) {
            assert_eq!(self.validate(), Ok(()));
        }
        Ok(())
    }

    /// Deletes the node containing the given key from the tree and returns its value.
    ///
    /// # Errors
    ///
    /// [`AvlError::KeyNotFound`] if the key is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_avl::{AvlError, Tree};
    ///
    /// let mut tree = Tree::new();
    /// tree.insert(1, 2).unwrap();
    ///
    /// assert_eq!(tree.delete(&1), Ok(2));
    /// assert_eq!(tree.delete(&1), Err(AvlError::KeyNotFound));
    /// ```
    pub fn delete(&mut self, key: &K) -> Result<V, AvlError>
    where
        K: Ord,
    {
        let value = match Node::delete(&mut self.root, key) {
            Ok(value) => value,
            Err(err) => {
                debug!("delete rejected: {err}");
                return Err(err);
            }
        };
        self.len -= 1;

        if cfg!(test) {
            assert_eq!(self.validate(), Ok(()));
        }
        Ok(value)
    }

    /// Potentially finds the value associated with the given key in this tree. If no node has the
    /// corresponding key, `None` is returned.
    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: Ord,
    {
        self.find(key).map(|node| &node.value)
    }

    /// Like [`get`][Tree::get] but the value can be modified in place.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V>
    where
        K: Ord,
    {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
                Ordering::Greater => node.right.as_deref_mut(),
            };
        }
        None
    }

    /// Whether a node with the given key is stored.
    pub fn contains_key(&self, key: &K) -> bool
    where
        K: Ord,
    {
        self.find(key).is_some()
    }

    /// Returns the entry with the `k`-th largest key. `k` is 1-based so `kth_largest(1)` is the
    /// maximum and `kth_largest(tree.len())` is the minimum.
    ///
    /// # Errors
    ///
    /// [`AvlError::RankOutOfRange`] unless `1 <= k <= len`. An empty tree rejects every `k`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_avl::{AvlError, Tree};
    ///
    /// let mut tree = Tree::new();
    /// for key in [3, 1, 2] {
    ///     tree.insert(key, key * 10).unwrap();
    /// }
    ///
    /// assert_eq!(tree.kth_largest(1), Ok((&3, &30)));
    /// assert_eq!(tree.kth_largest(3), Ok((&1, &10)));
    /// assert_eq!(tree.kth_largest(4), Err(AvlError::RankOutOfRange { rank: 4, len: 3 }));
    /// ```
    pub fn kth_largest(&self, k: usize) -> Result<(&K, &V), AvlError> {
        let out_of_range = AvlError::RankOutOfRange {
            rank: k,
            len: self.len,
        };
        if k == 0 || k > self.len {
            debug!("kth_largest rejected: {out_of_range}");
            return Err(out_of_range);
        }

        // `k` is always the wanted rank counted from the largest key of the current subtree.
        let mut k = k;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            let rank = node.right_count + 1;
            current = match k.cmp(&rank) {
                Ordering::Less => node.right.as_deref(),
                Ordering::Equal => return Ok((&node.key, &node.value)),
                Ordering::Greater => {
                    k -= rank;
                    node.left.as_deref()
                }
            };
        }

        // Only reachable if the right counts disagree with `len`.
        Err(out_of_range)
    }

    /// The inverse of [`kth_largest`][Tree::kth_largest]: the 1-based rank of the key counting
    /// down from the largest, or `None` if the key is not stored.
    pub fn rank_of(&self, key: &K) -> Option<usize>
    where
        K: Ord,
    {
        let mut larger = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Less => {
                    larger += node.right_count + 1;
                    node.left.as_deref()
                }
                Ordering::Equal => return Some(larger + node.right_count + 1),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }

    /// The entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    /// The entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some((&node.key, &node.value))
    }

    /// Iterates over the entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_deref(), self.len)
    }

    /// Walks the whole tree checking every structural invariant: keys in strictly ascending
    /// in-order sequence, correct heights, balance factors within one, right counts equal to the
    /// size of each right subtree, and `len` equal to the number of nodes.
    ///
    /// This is `O(N)`; it's meant for tests and debugging.
    pub fn validate(&self) -> Result<(), InvariantViolation>
    where
        K: Ord,
    {
        let (size, _) = validate(&self.root, None, None)?;
        if size != self.len {
            return Err(InvariantViolation::LenMismatch {
                expected: size,
                found: self.len,
            });
        }
        Ok(())
    }

    fn find(&self, key: &K) -> Option<&Node<K, V>>
    where
        K: Ord,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Equal => return Some(node),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }
}

impl<'a, K, V> IntoIterator for &'a Tree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,

    /// How many levels are in the subtree rooted at this node.
    /// A node with no children has a height of 1.
    height: usize,

    /// How many nodes are in the right subtree.
    right_count: usize,
}

fn height<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

/// Rebalances the subtree in `link` and reattaches whatever node ends up as its root.
fn rebalance<K, V>(link: &mut Link<K, V>) {
    if let Some(node) = link.take() {
        *link = Some(Node::rebalance(node));
    }
}

/// Returns the size and height of the subtree in `link` if every node in it holds the
/// invariants. All keys must be strictly between `lower` and `upper`.
fn validate<'a, K, V>(
    link: &'a Link<K, V>,
    lower: Option<&'a K>,
    upper: Option<&'a K>,
) -> Result<(usize, usize), InvariantViolation>
where
    K: Ord,
{
    let Some(node) = link else {
        return Ok((0, 0));
    };
    if lower.is_some_and(|lower| node.key <= *lower)
        || upper.is_some_and(|upper| node.key >= *upper)
    {
        return Err(InvariantViolation::Unordered);
    }

    let (left_size, left_height) = validate(&node.left, lower, Some(&node.key))?;
    let (right_size, right_height) = validate(&node.right, Some(&node.key), upper)?;

    let expected_height = left_height.max(right_height) + 1;
    if node.height != expected_height {
        return Err(InvariantViolation::HeightMismatch {
            expected: expected_height,
            found: node.height,
        });
    }
    let balance = right_height as isize - left_height as isize;
    if balance.abs() > 1 {
        return Err(InvariantViolation::Unbalanced { balance });
    }
    if node.right_count != right_size {
        return Err(InvariantViolation::RightCountMismatch {
            expected: right_size,
            found: node.right_count,
        });
    }

    Ok((left_size + right_size + 1, expected_height))
}

impl<K, V> Node<K, V> {
    fn new_boxed(key: K, value: V) -> Box<Self> {
        Box::new(Node {
            key,
            value,
            left: None,
            right: None,
            height: 1,
            right_count: 0,
        })
    }

    fn fix_height(&mut self) {
        self.height = height(&self.left).max(height(&self.right)) + 1;
    }

    fn balance_factor(&self) -> isize {
        height(&self.right) as isize - height(&self.left) as isize
    }

    /// Inserts into the subtree in `link`. The right count of a node only grows once the insert
    /// below it has succeeded, so a duplicate key leaves every node untouched.
    fn insert(link: &mut Link<K, V>, key: K, value: V) -> Result<(), AvlError>
    where
        K: Ord,
    {
        match link {
            None => {
                *link = Some(Self::new_boxed(key, value));
                Ok(())
            }
            Some(node) => {
                match key.cmp(&node.key) {
                    Ordering::Less => Self::insert(&mut node.left, key, value)?,
                    Ordering::Equal => return Err(AvlError::DuplicateKey),
                    Ordering::Greater => {
                        Self::insert(&mut node.right, key, value)?;
                        node.right_count += 1;
                    }
                }
                node.fix_height();
                rebalance(link);
                Ok(())
            }
        }
    }

    /// Deletes `key` from the subtree in `link` and returns its value.
    fn delete(link: &mut Link<K, V>, key: &K) -> Result<V, AvlError>
    where
        K: Ord,
    {
        let Some(node) = link else {
            return Err(AvlError::KeyNotFound);
        };

        let value = match key.cmp(&node.key) {
            Ordering::Less => Self::delete(&mut node.left, key)?,
            Ordering::Greater => {
                let value = Self::delete(&mut node.right, key)?;
                node.right_count -= 1;
                value
            }
            Ordering::Equal if node.left.is_some() && node.right.is_some() => {
                // Promote the successor (the smallest key on the right) into this node. The
                // node keeps its place in the tree; only its entry changes.
                let successor = Self::take_min(&mut node.right)
                    .expect("A node with two children has a right subtree");
                node.right_count -= 1;
                trace!("promoting in-order successor into a node with two children");

                let Node { key, value, .. } = *successor;
                node.key = key;
                mem::replace(&mut node.value, value)
            }
            Ordering::Equal => {
                // Zero or one child: splice this node out in favour of its child.
                let mut deleted = link.take().expect("Deleting a node implies the node exists");
                *link = deleted.left.take().or_else(|| deleted.right.take());
                return Ok(deleted.value);
            }
        };

        node.fix_height();
        rebalance(link);
        Ok(value)
    }

    /// Detaches the node with the smallest key from the subtree in `link`, rebalancing each
    /// node on the way back up. The detached node has no children.
    fn take_min(link: &mut Link<K, V>) -> Option<Box<Self>> {
        let node = link.as_mut()?;
        if node.left.is_some() {
            let min = Self::take_min(&mut node.left);
            node.fix_height();
            rebalance(link);
            min
        } else {
            let mut min = link.take()?;
            *link = min.right.take();
            Some(min)
        }
    }

    /// Balances a subtree whose children are already balanced and whose height is already
    /// correct, returning the root of the balanced subtree.
    ///
    /// See https://en.wikipedia.org/wiki/AVL_tree#Rebalancing for terminology.
    fn rebalance(mut node: Box<Self>) -> Box<Self> {
        let balance = node.balance_factor();
        let root = if balance >= 2 {
            let right = node.right.take().expect("Right heavy => right child");
            node.right = Some(if height(&right.left) > height(&right.right) {
                trace!("rebalancing right-left");
                Self::rotate_right(right)
            } else {
                trace!("rebalancing right-right");
                right
            });
            Self::rotate_left(node)
        } else if balance <= -2 {
            let left = node.left.take().expect("Left heavy => left child");
            node.left = Some(if height(&left.right) > height(&left.left) {
                trace!("rebalancing left-right");
                Self::rotate_left(left)
            } else {
                trace!("rebalancing left-left");
                left
            });
            Self::rotate_right(node)
        } else {
            node
        };

        if cfg!(debug_assertions) {
            let left_height = height(&root.left);
            let right_height = height(&root.right);
            assert_eq!(root.height, left_height.max(right_height) + 1);
            assert!(left_height.abs_diff(right_height) <= 1);
        }
        root
    }

    /// Rotate `node` to the left. This moves the right child up vertically and `node` down
    /// vertically.
    ///
    /// ## Panics
    ///
    /// When called on a node without a right child.
    ///
    /// # Diagram
    ///
    /// ```text
    ///    old_root                    new_root
    ///    /     \                     /     \
    ///   x    new_root  rotate ->  old_root  z
    ///          / \                  /  \
    ///         y   z                x    y
    /// ```
    ///
    /// `old_root` loses `new_root` and `z` from its right subtree. `new_root`'s right subtree
    /// is still `z` so its count stays as it is.
    fn rotate_left(mut old_root: Box<Self>) -> Box<Self> {
        let mut new_root = old_root.right.take().expect("Rotate left => right child");

        old_root.right = new_root.left.take();
        old_root.right_count -= new_root.right_count + 1;
        old_root.fix_height();

        new_root.left = Some(old_root);
        new_root.fix_height();
        new_root
    }

    /// Rotate `node` to the right. This moves the left child up vertically and `node` down
    /// vertically.
    ///
    /// ## Panics
    ///
    /// When called on a node without a left child.
    ///
    /// # Diagram
    ///
    /// ```text
    ///      old_root              new_root
    ///       /     \              /     \
    ///   new_root   z  rotate -> x    old_root
    ///     / \                          /  \
    ///    x   y                        y    z
    /// ```
    ///
    /// `new_root` gains `old_root` and `z` in its right subtree. `old_root`'s right subtree is
    /// still `z` so its count stays as it is.
    fn rotate_right(mut old_root: Box<Self>) -> Box<Self> {
        let mut new_root = old_root.left.take().expect("Rotate right => left child");

        old_root.left = new_root.right.take();
        old_root.fix_height();

        new_root.right_count += old_root.right_count + 1;
        new_root.right = Some(old_root);
        new_root.fix_height();
        new_root
    }

    fn draw_children(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result
    where
        K: fmt::Display,
    {
        if self.left.is_none() && self.right.is_none() {
            return Ok(());
        }

        for (child, is_last) in [(&self.left, false), (&self.right, true)] {
            let (branch, indent) = if is_last {
                ("└─ ", "   ")
            } else {
                ("├─ ", "│  ")
            };
            match child {
                Some(child) => {
                    writeln!(f, "{prefix}{branch}{}", child.key)?;
                    child.draw_children(f, &format!("{prefix}{indent}"))?;
                }
                None => writeln!(f, "{prefix}{branch}*")?,
            }
        }
        Ok(())
    }
}
