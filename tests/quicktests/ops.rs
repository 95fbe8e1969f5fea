use quickcheck::{Arbitrary, Gen};

/// An enum for the various kinds of "things" to do to
/// the tree in a quicktest.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Op<K, V> {
    /// Insert the K, V into the data structure
    Insert(K, V),
    /// Remove the K from the data structure
    Remove(K),
    /// Ask for the entry at this rank
    KthLargest(usize),
}

impl<K, V> Arbitrary for Op<K, V>
where
    K: Arbitrary,
    V: Arbitrary,
{
    /// Tells quickcheck how to randomly choose an operation. Inserts are
    /// weighted up so trees actually grow.
    fn arbitrary(g: &mut Gen) -> Self {
        match g.choose(&[0, 0, 1, 2]).unwrap() {
            0 => Op::Insert(K::arbitrary(g), V::arbitrary(g)),
            1 => Op::Remove(K::arbitrary(g)),
            2 => Op::KthLargest(usize::arbitrary(g) % (g.size() + 2)),
            _ => unreachable!(),
        }
    }
}
