//! Partition representation
//!
//! A [`Partition`] is a contiguous span of the simulated heap. It is either
//! occupied (carrying the [`Tag`] of the request that allocated it) or free.
//! Free partitions have no tag, which replaces the `-1` sentinel a raw
//! integer field would need.

use std::fmt;

/// Heap offset in bytes
pub type Address = u64;

/// Owner identifier attached to an allocation request
pub type Tag = u64;

/// A contiguous span of heap address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub tag: Option<Tag>, // None = free
    pub size: u64,
    pub address: Address,
}

impl Partition {
    /// Create a free partition
    pub fn free(size: u64, address: Address) -> Self {
        Partition {
            tag: None,
            size,
            address,
        }
    }

    /// Create a partition owned by `tag`
    pub fn occupied(tag: Tag, size: u64, address: Address) -> Self {
        Partition {
            tag: Some(tag),
            size,
            address,
        }
    }

    pub fn is_free(&self) -> bool {
        self.tag.is_none()
    }

    /// One past the last byte covered by this partition
    pub fn end(&self) -> Address {
        self.address + self.size
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => write!(
                f,
                "[{}, {}) tag={} size={}",
                self.address,
                self.end(),
                tag,
                self.size
            ),
            None => write!(
                f,
                "[{}, {}) free size={}",
                self.address,
                self.end(),
                self.size
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_and_occupied() {
        let free = Partition::free(40, 60);
        assert!(free.is_free());
        assert_eq!(free.end(), 100);

        let used = Partition::occupied(7, 10, 50);
        assert!(!used.is_free());
        assert_eq!(used.tag, Some(7));
        assert_eq!(used.end(), 60);
    }

    #[test]
    fn test_display() {
        assert_eq!(Partition::free(40, 60).to_string(), "[60, 100) free size=40");
        assert_eq!(
            Partition::occupied(3, 150, 0).to_string(),
            "[0, 150) tag=3 size=150"
        );
    }
}
