//! Worst-fit allocator core
//!
//! This module provides the allocator and the structures it keeps in sync:
//! - [`partition`]: Tagged or free spans of heap address space
//! - [`arena`]: Address-ordered partition list with generation-checked handles
//! - [`free_index`]: Free partitions ordered for worst-fit selection
//! - [`worst_fit`]: The [`Allocator`] itself (allocate, deallocate, stats)
//! - [`invariants`]: Structural consistency checks
//!
//! # Growth
//!
//! The heap starts empty and grows in whole pages:
//! ```text
//! needed = size - free_tail.size   (or size, if the tail is occupied)
//! pages  = ceil(needed / page_size)
//! slack  = pages * page_size - needed   →  new free tail
//! ```

pub mod arena;
pub mod free_index;
pub mod invariants;
pub mod partition;
pub mod worst_fit;

pub use arena::PartitionId;
pub use invariants::InvariantViolation;
pub use partition::{Address, Partition, Tag};
pub use worst_fit::{Allocator, MemSimResult};
