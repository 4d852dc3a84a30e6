//! Worst-fit selection index over free partitions
//!
//! Free partitions are kept in a `BTreeSet` ordered by size (largest first)
//! and then by address (lowest first). The first entry is the worst-fit
//! candidate; any entry can be removed in O(log n) given the partition's
//! current size and address.
//!
//! Entries are keyed by a partition's size and address *at insertion time*.
//! A free partition must be removed before either field changes and
//! reinserted afterwards.

use super::arena::PartitionId;
use super::partition::{Address, Partition};
use std::cmp::Reverse;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FreeKey {
    size: Reverse<u64>,
    address: Address,
    id: PartitionId,
}

impl FreeKey {
    fn new(id: PartitionId, partition: &Partition) -> Self {
        FreeKey {
            size: Reverse(partition.size),
            address: partition.address,
            id,
        }
    }
}

/// Free partitions ordered by (size desc, address asc)
#[derive(Debug, Clone, Default)]
pub struct FreeIndex {
    entries: BTreeSet<FreeKey>,
}

impl FreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns false if the entry was already present
    pub fn insert(&mut self, id: PartitionId, partition: &Partition) -> bool {
        self.entries.insert(FreeKey::new(id, partition))
    }

    /// Returns false if no entry matched
    pub fn remove(&mut self, id: PartitionId, partition: &Partition) -> bool {
        self.entries.remove(&FreeKey::new(id, partition))
    }

    pub fn contains(&self, id: PartitionId, partition: &Partition) -> bool {
        self.entries.contains(&FreeKey::new(id, partition))
    }

    /// The worst-fit candidate: largest free partition, lowest address on ties
    pub fn first(&self) -> Option<PartitionId> {
        self.entries.first().map(|key| key.id)
    }

    /// Handles in selection order
    pub fn iter(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.entries.iter().map(|key| key.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::arena::PartitionArena;

    #[test]
    fn test_largest_first_lowest_address_on_tie() {
        let mut arena = PartitionArena::new();
        let small = arena.push_back(Partition::free(10, 0));
        let late = arena.push_back(Partition::free(40, 200));
        let early = arena.push_back(Partition::free(40, 100));

        let mut index = FreeIndex::new();
        for id in [small, late, early] {
            assert!(index.insert(id, &arena[id]));
        }

        assert_eq!(index.first(), Some(early));
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![early, late, small]);
    }

    #[test]
    fn test_remove_requires_current_key() {
        let mut arena = PartitionArena::new();
        let id = arena.push_back(Partition::free(10, 0));
        let mut index = FreeIndex::new();
        index.insert(id, &arena[id]);

        let stale = Partition::free(5, 0);
        assert!(!index.remove(id, &stale));
        assert!(index.contains(id, &arena[id]));

        assert!(index.remove(id, &arena[id]));
        assert!(index.is_empty());
        assert_eq!(index.first(), None);
    }

    #[test]
    fn test_zero_size_entry_loses_to_any_nonempty() {
        let mut arena = PartitionArena::new();
        let empty = arena.push_back(Partition::free(0, 0));
        let one = arena.push_back(Partition::free(1, 50));

        let mut index = FreeIndex::new();
        index.insert(empty, &arena[empty]);
        assert_eq!(index.first(), Some(empty));

        index.insert(one, &arena[one]);
        assert_eq!(index.first(), Some(one));
        assert_eq!(index.len(), 2);
    }
}
