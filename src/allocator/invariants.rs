//! Structural checks over an [`Allocator`]
//!
//! [`Allocator::check_invariants`] walks the partition list, the free index
//! and the tag index and reports the first inconsistency it finds. The engine
//! runs it after every request in debug builds; the integration tests run it
//! after every step of randomized request sequences.

use super::partition::{Address, Tag};
use super::worst_fit::Allocator;
use std::fmt;

/// First broken invariant found by [`Allocator::check_invariants`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The partition list does not start at address 0 or has a gap/overlap
    Gap { expected: Address, found: Address },

    /// Two address-adjacent partitions are both free
    AdjacentFree { address: Address },

    /// Heap size is not a whole number of pages
    PartialPage { heap_size: u64, page_size: u64 },

    /// A free partition is missing from the free index
    FreeNotIndexed { address: Address },

    /// The free index holds an entry that is not a live free partition
    StaleFreeEntry,

    /// Free index and partition list disagree on the number of free partitions
    FreeCountMismatch { indexed: usize, actual: usize },

    /// A tag index entry points at a missing partition or one with another tag
    StaleTagEntry { tag: Tag },

    /// An occupied partition is not listed under its tag
    TagNotIndexed { tag: Tag, address: Address },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::Gap { expected, found } => write!(
                f,
                "partition starts at {} but previous one ends at {}",
                found, expected
            ),
            InvariantViolation::AdjacentFree { address } => {
                write!(f, "adjacent free partitions meet at {}", address)
            }
            InvariantViolation::PartialPage {
                heap_size,
                page_size,
            } => write!(
                f,
                "heap size {} is not a multiple of page size {}",
                heap_size, page_size
            ),
            InvariantViolation::FreeNotIndexed { address } => {
                write!(f, "free partition at {} missing from free index", address)
            }
            InvariantViolation::StaleFreeEntry => {
                write!(f, "free index entry does not match a free partition")
            }
            InvariantViolation::FreeCountMismatch { indexed, actual } => write!(
                f,
                "free index holds {} entries but {} partitions are free",
                indexed, actual
            ),
            InvariantViolation::StaleTagEntry { tag } => {
                write!(f, "tag {} lists a partition it does not own", tag)
            }
            InvariantViolation::TagNotIndexed { tag, address } => write!(
                f,
                "partition at {} owned by tag {} missing from tag index",
                address, tag
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

impl Allocator {
    /// Verify tiling, merging, page rounding and both indices
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let arena = self.arena();
        let free_index = self.free_index();
        let tag_index = self.tag_index();

        let mut expected: Address = 0;
        let mut prev_free = false;
        let mut free_count = 0;

        for (id, partition) in arena.iter() {
            if partition.address != expected {
                return Err(InvariantViolation::Gap {
                    expected,
                    found: partition.address,
                });
            }
            expected = partition.end();

            match partition.tag {
                None => {
                    if prev_free {
                        return Err(InvariantViolation::AdjacentFree {
                            address: partition.address,
                        });
                    }
                    if !free_index.contains(id, partition) {
                        return Err(InvariantViolation::FreeNotIndexed {
                            address: partition.address,
                        });
                    }
                    free_count += 1;
                }
                Some(tag) => {
                    let listed = tag_index
                        .get(&tag)
                        .is_some_and(|owned| owned.contains(&id));
                    if !listed {
                        return Err(InvariantViolation::TagNotIndexed {
                            tag,
                            address: partition.address,
                        });
                    }
                }
            }
            prev_free = partition.is_free();
        }

        if expected % self.page_size() != 0 {
            return Err(InvariantViolation::PartialPage {
                heap_size: expected,
                page_size: self.page_size(),
            });
        }

        if free_index.len() != free_count {
            return Err(InvariantViolation::FreeCountMismatch {
                indexed: free_index.len(),
                actual: free_count,
            });
        }

        for id in free_index.iter() {
            if !arena.get(id).is_some_and(|p| p.is_free()) {
                return Err(InvariantViolation::StaleFreeEntry);
            }
        }

        for (&tag, owned) in tag_index {
            for &id in owned {
                if arena.get(id).map(|p| p.tag) != Some(Some(tag)) {
                    return Err(InvariantViolation::StaleTagEntry { tag });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_allocator_is_consistent() {
        let allocator = Allocator::new(4096).unwrap();
        assert_eq!(allocator.check_invariants(), Ok(()));
    }

    #[test]
    fn test_consistent_through_split_grow_merge() {
        let mut allocator = Allocator::new(32).unwrap();
        for (tag, size) in [(1, 10), (2, 40), (3, 5), (4, 33)] {
            allocator.allocate(tag, size).unwrap();
            assert_eq!(allocator.check_invariants(), Ok(()));
        }
        for tag in [2, 4, 1, 3] {
            allocator.deallocate(tag);
            assert_eq!(allocator.check_invariants(), Ok(()));
        }
        assert_eq!(allocator.partition_count(), 1);
    }

    #[test]
    fn test_violation_messages() {
        let gap = InvariantViolation::Gap {
            expected: 50,
            found: 60,
        };
        assert_eq!(
            gap.to_string(),
            "partition starts at 60 but previous one ends at 50"
        );
        assert_eq!(
            InvariantViolation::StaleTagEntry { tag: 9 }.to_string(),
            "tag 9 lists a partition it does not own"
        );
    }
}
