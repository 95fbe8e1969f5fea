use rank_avl::{AvlError, Tree};

use quickcheck_macros::quickcheck;
use std::collections::{BTreeMap, HashSet};

use crate::Op;

/// Applies a set of operations to a tree and a `BTreeMap`, checking after
/// every step that both agree and that the tree's invariants still hold.
fn do_ops<K, V>(ops: &[Op<K, V>], tree: &mut Tree<K, V>, map: &mut BTreeMap<K, V>) -> bool
where
    K: Ord + Clone + std::fmt::Debug,
    V: PartialEq + Clone + std::fmt::Debug,
{
    for op in ops {
        let agrees = match op {
            Op::Insert(k, v) => {
                let expected = if map.contains_key(k) {
                    Err(AvlError::DuplicateKey)
                } else {
                    map.insert(k.clone(), v.clone());
                    Ok(())
                };
                tree.insert(k.clone(), v.clone()) == expected
            }
            Op::Remove(k) => tree.delete(k) == map.remove(k).ok_or(AvlError::KeyNotFound),
            Op::KthLargest(rank) => {
                let expected = match rank.checked_sub(1).and_then(|i| map.iter().rev().nth(i)) {
                    Some(entry) => Ok(entry),
                    None => Err(AvlError::RankOutOfRange {
                        rank: *rank,
                        len: map.len(),
                    }),
                };
                tree.kth_largest(*rank) == expected
            }
        };

        if !agrees || tree.len() != map.len() || tree.validate().is_err() {
            return false;
        }
    }

    true
}

#[quickcheck]
fn fuzz_multiple_operations_i8(ops: Vec<Op<i8, i8>>) -> bool {
    let mut tree = Tree::new();
    let mut map = BTreeMap::new();

    do_ops(&ops, &mut tree, &mut map) && tree.iter().eq(map.iter())
}

#[quickcheck]
fn every_rank_matches_descending_order(xs: HashSet<i16>) -> bool {
    let mut tree = Tree::new();
    for x in &xs {
        tree.insert(*x, ()).unwrap();
    }

    let mut descending: Vec<_> = xs.into_iter().collect();
    descending.sort_unstable_by(|a, b| b.cmp(a));

    descending.iter().enumerate().all(|(i, x)| {
        tree.kth_largest(i + 1).map(|(k, _)| k) == Ok(x) && tree.rank_of(x) == Some(i + 1)
    }) && tree.kth_largest(descending.len() + 1).is_err()
}

#[quickcheck]
fn with_deletions(xs: HashSet<i8>, deletes: Vec<i8>) -> bool {
    let mut tree = Tree::new();
    for x in &xs {
        tree.insert(*x, *x).unwrap();
    }
    for delete in &deletes {
        let expected = if xs.contains(delete) && tree.contains_key(delete) {
            Ok(*delete)
        } else {
            Err(AvlError::KeyNotFound)
        };
        if tree.delete(delete) != expected || tree.validate().is_err() {
            return false;
        }
    }

    deletes.iter().all(|x| !tree.contains_key(x))
        && xs
            .iter()
            .filter(|x| !deletes.contains(*x))
            .all(|x| tree.get(x) == Some(x))
}

#[quickcheck]
fn delete_all_then_reinsert(xs: HashSet<i16>, order: Vec<usize>) -> bool {
    let mut tree = Tree::new();
    for x in &xs {
        tree.insert(*x, ()).unwrap();
    }
    let before: Vec<_> = (1..=tree.len())
        .map(|k| *tree.kth_largest(k).unwrap().0)
        .collect();

    // Delete in an arbitrary order driven by `order`.
    let mut remaining: Vec<_> = xs.iter().copied().collect();
    let mut picks = order.into_iter().cycle();
    while !remaining.is_empty() {
        let i = picks.next().unwrap_or(0) % remaining.len();
        let key = remaining.swap_remove(i);
        if tree.delete(&key).is_err() || tree.validate().is_err() {
            return false;
        }
    }
    if !tree.is_empty() || tree.height() != 0 {
        return false;
    }

    for x in &xs {
        tree.insert(*x, ()).unwrap();
    }
    let after: Vec<_> = (1..=tree.len())
        .map(|k| *tree.kth_largest(k).unwrap().0)
        .collect();

    before == after
}

#[quickcheck]
fn queries_do_not_mutate(xs: HashSet<i8>, k: usize) -> bool {
    let mut tree = Tree::new();
    for x in &xs {
        tree.insert(*x, *x).unwrap();
    }
    let k = if tree.is_empty() { 1 } else { k % tree.len() + 1 };

    let first = tree.kth_largest(k).map(|(k, v)| (*k, *v));
    let drawing = format!("{tree:?}");
    let second = tree.kth_largest(k).map(|(k, v)| (*k, *v));

    first == second && drawing == format!("{tree:?}") && tree.validate().is_ok()
}
