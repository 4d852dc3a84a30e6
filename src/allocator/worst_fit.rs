//! Worst-fit allocator with on-demand heap growth
//!
//! The [`Allocator`] keeps three structures in lockstep:
//!
//! - the partition list ([`PartitionArena`]), a gapless tiling of
//!   `[0, total_heap_size)` in address order
//! - the [`FreeIndex`], holding exactly the free partitions
//! - the tag index, mapping each live tag to the partitions it owns
//!
//! # Allocation
//!
//! The largest free partition (lowest address on ties) is split when it can
//! hold the request. Otherwise the heap grows by the minimum number of whole
//! pages, reusing the bytes of a free tail partition if there is one.
//!
//! # Deallocation
//!
//! Every partition owned by the tag becomes free and absorbs its free
//! neighbours, so no two adjacent partitions are ever both free.
//!
//! # Thread Safety
//!
//! An `Allocator` has no internal synchronization. The three structures are
//! only mutually consistent between calls, so sharing one across threads
//! requires an external lock around every mutation.

use super::arena::{PartitionArena, PartitionId};
use super::free_index::FreeIndex;
use super::partition::{Address, Partition, Tag};
use crate::constants::{MAX_PAGE_SIZE, MIN_PAGE_SIZE};
use crate::errors::SimError;
use rustc_hash::FxHashMap;
use std::fmt;

/// End-of-run statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemSimResult {
    pub max_free_partition_address: Address,
    pub max_free_partition_size: u64,
    pub n_pages_requested: u64,
}

impl fmt::Display for MemSimResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pages requested: {}", self.n_pages_requested)?;
        writeln!(
            f,
            "largest free partition size: {}",
            self.max_free_partition_size
        )?;
        write!(
            f,
            "largest free partition address: {}",
            self.max_free_partition_address
        )
    }
}

/// Placement of a request that needs the heap to grow
#[derive(Debug, Clone, Copy)]
struct Growth {
    address: Address,
    pages: u64,
    slack: u64,
    heap_end: Address,
}

/// Worst-fit partition allocator over a paged, growable heap
#[derive(Debug, Clone)]
pub struct Allocator {
    page_size: u64,
    partitions: PartitionArena,
    free_index: FreeIndex,
    tagged: FxHashMap<Tag, Vec<PartitionId>>,
    pages_requested: u64,
}

impl Allocator {
    /// Create an allocator whose heap holds a single empty free partition
    pub fn new(page_size: u64) -> Result<Self, SimError> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(SimError::InvalidPageSize {
                page_size: i64::try_from(page_size).unwrap_or(i64::MAX),
            });
        }

        let mut partitions = PartitionArena::new();
        let mut free_index = FreeIndex::new();
        let sentinel = Partition::free(0, 0);
        let id = partitions.push_back(sentinel);
        free_index.insert(id, &sentinel);

        Ok(Allocator {
            page_size,
            partitions,
            free_index,
            tagged: FxHashMap::default(),
            pages_requested: 0,
        })
    }

    /// Allocate `size` bytes under `tag`, returning the partition's address.
    ///
    /// A tag that is still live may be reused; it then owns several
    /// partitions, all released by one [`deallocate`](Self::deallocate).
    pub fn allocate(&mut self, tag: Tag, size: u64) -> Result<Address, SimError> {
        if size == 0 {
            return Err(SimError::InvalidAllocationSize {
                tag,
                size: 0,
                line: None,
            });
        }

        if let Some(candidate) = self.free_index.first() {
            if self.partitions[candidate].size >= size {
                return Ok(self.split(candidate, tag, size));
            }
        }

        let growth = self
            .plan_growth(size)
            .ok_or(SimError::HeapExhausted { tag, size })?;
        Ok(self.grow(tag, size, growth))
    }

    /// Free every partition owned by `tag`. Unknown tags are ignored.
    pub fn deallocate(&mut self, tag: Tag) {
        let Some(owned) = self.tagged.remove(&tag) else {
            return;
        };

        for id in owned {
            self.release(id);
        }
    }

    /// Largest free partition and total pages requested so far
    pub fn stats(&self) -> MemSimResult {
        let mut result = MemSimResult {
            n_pages_requested: self.pages_requested,
            ..MemSimResult::default()
        };

        if let Some(id) = self.free_index.first() {
            let largest = &self.partitions[id];
            result.max_free_partition_address = largest.address;
            result.max_free_partition_size = largest.size;
        }

        result
    }

    /// Carve an occupied partition off the front of a free one
    fn split(&mut self, candidate: PartitionId, tag: Tag, size: u64) -> Address {
        let free = self.partitions[candidate];
        self.free_index.remove(candidate, &free);

        let occupied = Partition::occupied(tag, size, free.address);
        let id = match self.partitions.insert_before(candidate, occupied) {
            Some(id) => id,
            None => unreachable!("free index holds stale handle {:?}", candidate),
        };

        let remainder = &mut self.partitions[candidate];
        remainder.address += size;
        remainder.size -= size;
        let remainder = *remainder;
        self.free_index.insert(candidate, &remainder);

        self.tagged.entry(tag).or_default().push(id);
        free.address
    }

    /// Work out where a grown heap would place `size` bytes. `None` if the
    /// heap end or the page count would overflow `u64`.
    fn plan_growth(&self, size: u64) -> Option<Growth> {
        let (address, needed) = match self.partitions.last().map(|id| self.partitions[id]) {
            // Worst-fit already rejected the tail, so tail.size < size
            Some(tail) if tail.is_free() => (tail.address, size - tail.size),
            tail => (tail.map_or(0, |tail| tail.end()), size),
        };

        let pages = needed.div_ceil(self.page_size);
        let grown = pages.checked_mul(self.page_size)?;
        let heap_end = self.total_heap_size().checked_add(grown)?;
        self.pages_requested.checked_add(pages)?;

        Some(Growth {
            address,
            pages,
            slack: grown - needed,
            heap_end,
        })
    }

    /// Extend the heap by whole pages to satisfy a request no free
    /// partition can hold
    fn grow(&mut self, tag: Tag, size: u64, growth: Growth) -> Address {
        let id = match self.partitions.last() {
            Some(tail_id) if self.partitions[tail_id].is_free() => {
                let tail = self.partitions[tail_id];
                self.free_index.remove(tail_id, &tail);
                let reused = &mut self.partitions[tail_id];
                reused.tag = Some(tag);
                reused.size = size;
                tail_id
            }
            // Only reachable if the trailing free partition were ever dropped;
            // construction and every growth leave one in place
            _ => self
                .partitions
                .push_back(Partition::occupied(tag, size, growth.address)),
        };

        let trailing = Partition::free(growth.slack, growth.heap_end - growth.slack);
        let trailing_id = self.partitions.push_back(trailing);
        self.free_index.insert(trailing_id, &trailing);

        self.tagged.entry(tag).or_default().push(id);
        self.pages_requested += growth.pages;
        growth.address
    }

    /// Mark a partition free and merge it with free neighbours
    fn release(&mut self, id: PartitionId) {
        self.partitions[id].tag = None;

        if let Some(prev_id) = self.partitions.prev(id) {
            let prev = self.partitions[prev_id];
            if prev.is_free() {
                self.free_index.remove(prev_id, &prev);
                self.partitions.remove(prev_id);
                let merged = &mut self.partitions[id];
                merged.address = prev.address;
                merged.size += prev.size;
            }
        }

        if let Some(next_id) = self.partitions.next(id) {
            let next = self.partitions[next_id];
            if next.is_free() {
                self.free_index.remove(next_id, &next);
                self.partitions.remove(next_id);
                self.partitions[id].size += next.size;
            }
        }

        let merged = self.partitions[id];
        self.free_index.insert(id, &merged);
    }

    // ========== Introspection ==========

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn pages_requested(&self) -> u64 {
        self.pages_requested
    }

    /// Bytes covered by the partition list
    pub fn total_heap_size(&self) -> u64 {
        self.partitions
            .last()
            .map_or(0, |id| self.partitions[id].end())
    }

    /// Number of partitions, free and occupied
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of free partitions
    pub fn free_count(&self) -> usize {
        self.free_index.len()
    }

    pub fn partition(&self, id: PartitionId) -> Option<&Partition> {
        self.partitions.get(id)
    }

    /// All partitions in address order
    pub fn partitions(&self) -> impl Iterator<Item = (PartitionId, &Partition)> + '_ {
        self.partitions.iter()
    }

    /// Free partitions in worst-fit selection order
    pub fn free_partitions(&self) -> impl Iterator<Item = (PartitionId, &Partition)> + '_ {
        self.free_index
            .iter()
            .filter_map(|id| self.partitions.get(id).map(|p| (id, p)))
    }

    /// Partitions owned by `tag`, in allocation order
    pub fn tag_partitions(&self, tag: Tag) -> Vec<(PartitionId, &Partition)> {
        self.tagged
            .get(&tag)
            .map(|ids| {
                ids.iter()
                    .filter_map(|&id| self.partitions.get(id).map(|p| (id, p)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tags that currently own at least one partition, ascending
    pub fn live_tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.tagged.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    pub(super) fn arena(&self) -> &PartitionArena {
        &self.partitions
    }

    pub(super) fn free_index(&self) -> &FreeIndex {
        &self.free_index
    }

    pub(super) fn tag_index(&self) -> &FxHashMap<Tag, Vec<PartitionId>> {
        &self.tagged
    }
}

impl fmt::Display for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "heap: {} bytes, page size {}, {} page(s) requested",
            self.total_heap_size(),
            self.page_size,
            self.pages_requested
        )?;

        writeln!(f, "1. All partitions")?;
        for (_, partition) in self.partitions() {
            writeln!(f, "   {}", partition)?;
        }

        writeln!(f, "2. Free index")?;
        for (_, partition) in self.free_partitions() {
            writeln!(f, "   {}", partition)?;
        }

        writeln!(f, "3. Tag index")?;
        for tag in self.live_tags() {
            let spans: Vec<String> = self
                .tag_partitions(tag)
                .iter()
                .map(|(_, p)| format!("[{}, {})", p.address, p.end()))
                .collect();
            writeln!(f, "   tag {}: {}", tag, spans.join(" "))?;
        }

        Ok(())
    }
}
