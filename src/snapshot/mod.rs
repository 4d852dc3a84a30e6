// Snapshot management for stepping through a simulation

use crate::allocator::{Allocator, Partition, PartitionId};
use crate::errors::SimError;
use std::mem::size_of;

/// Allocator state after a request
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub allocator: Allocator,
    pub request_index: Option<usize>, // None = before the first request
}

impl Snapshot {
    pub fn new(allocator: Allocator, request_index: Option<usize>) -> Self {
        Snapshot {
            allocator,
            request_index,
        }
    }

    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        // Arena slot plus free-index entry per partition, one handle per
        // owned partition in the tag index
        let per_partition = size_of::<Partition>() + 2 * size_of::<PartitionId>() + 16;
        let partitions = self.allocator.partition_count() * per_partition;
        let free_entries = self.allocator.free_count() * (size_of::<PartitionId>() + 16);
        let tags = self.allocator.live_tags().len() * 48;

        size_of::<Self>() + partitions + free_entries + tags
    }
}

/// Manages simulation history for stepping backward and forward
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), SimError> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(SimError::SnapshotLimitExceeded {
                current: self.current_memory + snapshot_size,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot::new(Allocator::new(100).unwrap(), None)
    }

    #[test]
    fn test_push_tracks_memory() {
        let mut manager = SnapshotManager::new(1024 * 1024);
        let size = snapshot().estimated_size();

        manager.push(snapshot()).unwrap();
        manager.push(snapshot()).unwrap();

        assert_eq!(manager.len(), 2);
        assert_eq!(manager.memory_usage(), 2 * size);
        assert!(manager.get(1).is_some());
        assert!(manager.get(2).is_none());
        assert!(!manager.is_empty());
    }

    #[test]
    fn test_push_over_limit_is_rejected() {
        let size = snapshot().estimated_size();
        let mut manager = SnapshotManager::new(size);

        manager.push(snapshot()).unwrap();
        let err = manager.push(snapshot()).unwrap_err();

        assert_eq!(
            err,
            SimError::SnapshotLimitExceeded {
                current: 2 * size,
                limit: size
            }
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_estimate_grows_with_partitions() {
        let empty = snapshot();
        let mut allocator = Allocator::new(100).unwrap();
        allocator.allocate(1, 10).unwrap();
        allocator.allocate(2, 10).unwrap();
        let busy = Snapshot::new(allocator, Some(1));

        assert!(busy.estimated_size() > empty.estimated_size());
    }
}
