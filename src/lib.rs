//! # Introduction
//!
//! memsim replays a script of allocate/free requests against a simulated
//! variable-partition allocator. The heap starts empty and grows in whole
//! pages obtained from a backing store; requests are served worst-fit from
//! the largest free partition. At the end of a run it reports the largest
//! free partition and the number of pages requested.
//!
//! ## Pipeline
//!
//! ```text
//! Request script → Parser → Requests → Allocator → Snapshots → TUI
//!                                          ↓
//!                                    MemSimResult
//! ```
//!
//! 1. [`request`] — request type and the `<tag> [size]` line format.
//! 2. [`allocator`] — the worst-fit [`allocator::Allocator`]: partition list,
//!    free index, tag index.
//! 3. [`engine`] — [`engine::mem_sim`] for a one-shot run, and
//!    [`engine::Simulation`] which keeps a [`snapshot::Snapshot`] per request.
//! 4. [`ui`] — ratatui viewer for stepping through a simulation; not part of
//!    the stable library API.
//!
//! ## Example
//!
//! ```
//! use memsim::allocator::Allocator;
//!
//! let mut allocator = Allocator::new(100).unwrap();
//! allocator.allocate(1, 50).unwrap();
//! allocator.allocate(2, 10).unwrap();
//! allocator.deallocate(1);
//!
//! let stats = allocator.stats();
//! assert_eq!(stats.n_pages_requested, 1);
//! assert_eq!(stats.max_free_partition_size, 50);
//! assert_eq!(stats.max_free_partition_address, 0);
//! ```

pub mod allocator;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod request;
pub mod snapshot;
pub mod ui;

pub use engine::mem_sim;
