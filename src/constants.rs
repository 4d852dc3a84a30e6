// Constants for the allocator simulator

/// Smallest accepted page size in bytes
pub const MIN_PAGE_SIZE: u64 = 1;

/// Largest accepted page size in bytes
pub const MAX_PAGE_SIZE: u64 = 1_000_000;

/// Default memory budget for the snapshot history (256 MB)
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 256 * 1024 * 1024;
