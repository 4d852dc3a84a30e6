//! Error types for the simulator
//!
//! [`SimError`] covers everything that can be rejected at the boundary of the
//! allocator: an out-of-range page size, a non-positive allocation size, a
//! heap that would outgrow the 64-bit address space, a malformed request line,
//! and failed history navigation in the engine.
//!
//! The allocator algorithms themselves are total once their inputs are valid,
//! so a rejected call always leaves the allocator exactly as it was.

use crate::allocator::invariants::InvariantViolation;
use crate::allocator::Tag;
use std::fmt;

/// Errors reported by the simulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Page size outside `MIN_PAGE_SIZE..=MAX_PAGE_SIZE`
    InvalidPageSize { page_size: i64 },

    /// Allocation request with a size that is not positive
    InvalidAllocationSize {
        tag: Tag,
        size: i64,
        line: Option<usize>,
    },

    /// Growing the heap for this request would run past the address space
    HeapExhausted { tag: Tag, size: u64 },

    /// Malformed request line
    Parse { line: usize, message: String },

    /// Malformed command-line argument
    InvalidArgument { message: String },

    /// Snapshot history limit exceeded
    SnapshotLimitExceeded { current: usize, limit: usize },

    /// History navigation failed (already at either end, empty history)
    History { message: String },

    /// Allocator state check failed after a request
    Invariant {
        request: usize,
        violation: InvariantViolation,
    },
}

impl SimError {
    /// Input line the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            SimError::InvalidAllocationSize { line, .. } => *line,
            SimError::Parse { line, .. } => Some(*line),
            SimError::InvalidPageSize { .. } => None,
            SimError::HeapExhausted { .. } => None,
            SimError::InvalidArgument { .. } => None,
            SimError::SnapshotLimitExceeded { .. } => None,
            SimError::History { .. } => None,
            SimError::Invariant { .. } => None,
        }
    }

    /// Attach an input line to an error raised without one
    pub fn at_line(self, at: usize) -> Self {
        match self {
            SimError::InvalidAllocationSize {
                tag,
                size,
                line: None,
            } => SimError::InvalidAllocationSize {
                tag,
                size,
                line: Some(at),
            },
            other => other,
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidPageSize { page_size } => {
                write!(
                    f,
                    "Invalid page size: {} (must be between {} and {})",
                    page_size,
                    crate::constants::MIN_PAGE_SIZE,
                    crate::constants::MAX_PAGE_SIZE
                )
            }
            SimError::InvalidAllocationSize { tag, size, line } => {
                write!(
                    f,
                    "Invalid allocation size for tag {}: {} (must be positive)",
                    tag, size
                )?;
                if let Some(line) = line {
                    write!(f, " at line {}", line)?;
                }
                Ok(())
            }
            SimError::HeapExhausted { tag, size } => {
                write!(
                    f,
                    "Heap exhausted: cannot grow by {} bytes for tag {}",
                    size, tag
                )
            }
            SimError::Parse { line, message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            SimError::InvalidArgument { message } => {
                write!(f, "Invalid argument: {}", message)
            }
            SimError::SnapshotLimitExceeded { current, limit } => {
                write!(
                    f,
                    "Snapshot memory limit exceeded: {} bytes used, limit is {}",
                    current, limit
                )
            }
            SimError::History { message } => {
                write!(f, "History operation failed: {}", message)
            }
            SimError::Invariant { request, violation } => {
                write!(
                    f,
                    "Allocator state corrupted after request {}: {}",
                    request + 1,
                    violation
                )
            }
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_line_fills_missing_line_only() {
        let err = SimError::InvalidAllocationSize {
            tag: 4,
            size: 0,
            line: None,
        }
        .at_line(12);
        assert_eq!(err.line(), Some(12));
        assert_eq!(
            err.to_string(),
            "Invalid allocation size for tag 4: 0 (must be positive) at line 12"
        );

        let parse = SimError::Parse {
            line: 3,
            message: "bad".to_string(),
        };
        assert_eq!(parse.clone().at_line(9), parse);
    }

    #[test]
    fn test_page_size_message_names_bounds() {
        let err = SimError::InvalidPageSize { page_size: 0 };
        assert_eq!(
            err.to_string(),
            "Invalid page size: 0 (must be between 1 and 1000000)"
        );
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_heap_exhausted_has_no_line() {
        let err = SimError::HeapExhausted { tag: 3, size: 10 };
        assert_eq!(err.line(), None);
        assert_eq!(err.clone().at_line(5), err);
        assert_eq!(
            err.to_string(),
            "Heap exhausted: cannot grow by 10 bytes for tag 3"
        );
    }
}
