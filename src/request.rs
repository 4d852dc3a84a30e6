//! Allocation requests and their text format
//!
//! A request script holds one request per line:
//!
//! ```text
//! # tag  size
//! 1      50      allocate 50 bytes under tag 1
//! 2      10
//! -1             free everything tagged 1
//! ```
//!
//! A non-negative tag allocates and needs a positive size. A negative tag
//! frees the partitions of its magnitude; a size on a free line is ignored.
//! Blank lines and text after `#` are skipped.

use crate::allocator::{Allocator, Tag};
use crate::errors::SimError;
use std::fmt;

/// A single step of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Allocate { tag: Tag, size: u64 },
    Free { tag: Tag },
}

impl Request {
    /// Decode a raw `(tag, size)` pair: negative tags free `-tag`
    pub fn from_raw(tag: i64, size: i64) -> Result<Self, SimError> {
        if tag < 0 {
            return Ok(Request::Free {
                tag: tag.unsigned_abs(),
            });
        }

        let tag = tag.unsigned_abs();
        match u64::try_from(size) {
            Ok(size) if size > 0 => Ok(Request::Allocate { tag, size }),
            _ => Err(SimError::InvalidAllocationSize {
                tag,
                size,
                line: None,
            }),
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            Request::Allocate { tag, .. } | Request::Free { tag } => *tag,
        }
    }

    /// Parse one line. Returns `Ok(None)` for blank and comment-only lines.
    pub fn parse_line(text: &str, line: usize) -> Result<Option<Self>, SimError> {
        let content = match text.find('#') {
            Some(pos) => &text[..pos],
            None => text,
        };

        let mut fields = content.split_whitespace();
        let Some(tag_field) = fields.next() else {
            return Ok(None);
        };
        let tag = parse_int(tag_field, "tag", line)?;

        let size = match fields.next() {
            Some(field) => Some(parse_int(field, "size", line)?),
            None => None,
        };

        if let Some(extra) = fields.next() {
            return Err(SimError::Parse {
                line,
                message: format!("unexpected field '{}'", extra),
            });
        }

        let size = match size {
            Some(size) => size,
            None if tag < 0 => 0,
            None => {
                return Err(SimError::Parse {
                    line,
                    message: format!("allocation for tag {} is missing a size", tag),
                })
            }
        };

        Request::from_raw(tag, size)
            .map(Some)
            .map_err(|e| e.at_line(line))
    }

    /// Apply this request to an allocator
    pub fn apply(&self, allocator: &mut Allocator) -> Result<(), SimError> {
        match *self {
            Request::Allocate { tag, size } => allocator.allocate(tag, size).map(|_| ()),
            Request::Free { tag } => {
                allocator.deallocate(tag);
                Ok(())
            }
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Allocate { tag, size } => write!(f, "alloc tag={} size={}", tag, size),
            Request::Free { tag } => write!(f, "free  tag={}", tag),
        }
    }
}

/// Parse a whole request script
pub fn parse_requests(source: &str) -> Result<Vec<Request>, SimError> {
    let mut requests = Vec::new();
    for (index, text) in source.lines().enumerate() {
        if let Some(request) = Request::parse_line(text, index + 1)? {
            requests.push(request);
        }
    }
    Ok(requests)
}

/// Parse a page size argument, checking it against the accepted range
pub fn parse_page_size(text: &str) -> Result<u64, SimError> {
    let value: i64 = text.trim().parse().map_err(|_| SimError::InvalidArgument {
        message: format!("page size '{}' is not an integer", text.trim()),
    })?;

    match u64::try_from(value) {
        Ok(page_size)
            if (crate::constants::MIN_PAGE_SIZE..=crate::constants::MAX_PAGE_SIZE)
                .contains(&page_size) =>
        {
            Ok(page_size)
        }
        _ => Err(SimError::InvalidPageSize { page_size: value }),
    }
}

fn parse_int(field: &str, what: &str, line: usize) -> Result<i64, SimError> {
    field.parse().map_err(|_| SimError::Parse {
        line,
        message: format!("{} '{}' is not an integer", what, field),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_sign_selects_operation() {
        assert_eq!(
            Request::from_raw(3, 150),
            Ok(Request::Allocate { tag: 3, size: 150 })
        );
        assert_eq!(Request::from_raw(-3, 0), Ok(Request::Free { tag: 3 }));
        assert_eq!(
            Request::from_raw(i64::MIN, 0),
            Ok(Request::Free {
                tag: 1 << 63
            })
        );
    }

    #[test]
    fn test_from_raw_rejects_non_positive_size() {
        assert!(Request::from_raw(1, 0).is_err());
        assert_eq!(
            Request::from_raw(1, -5),
            Err(SimError::InvalidAllocationSize {
                tag: 1,
                size: -5,
                line: None
            })
        );
    }

    #[test]
    fn test_tag_zero_allocates() {
        assert_eq!(
            Request::parse_line("0 8", 1),
            Ok(Some(Request::Allocate { tag: 0, size: 8 }))
        );
    }

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert_eq!(Request::parse_line("", 1), Ok(None));
        assert_eq!(Request::parse_line("   \t ", 2), Ok(None));
        assert_eq!(Request::parse_line("# header", 3), Ok(None));
        assert_eq!(
            Request::parse_line("  5 20  # trailing", 4),
            Ok(Some(Request::Allocate { tag: 5, size: 20 }))
        );
    }

    #[test]
    fn test_free_line_size_optional() {
        assert_eq!(
            Request::parse_line("-5", 1),
            Ok(Some(Request::Free { tag: 5 }))
        );
        assert_eq!(
            Request::parse_line("-5 999", 1),
            Ok(Some(Request::Free { tag: 5 }))
        );
    }

    #[test]
    fn test_parse_line_errors_carry_line() {
        let missing = Request::parse_line("7", 4).unwrap_err();
        assert_eq!(missing.line(), Some(4));

        let bad_int = Request::parse_line("7 abc", 5).unwrap_err();
        assert_eq!(
            bad_int.to_string(),
            "Parse error at line 5: size 'abc' is not an integer"
        );

        let extra = Request::parse_line("1 2 3", 6).unwrap_err();
        assert_eq!(extra.line(), Some(6));

        let zero = Request::parse_line("1 0", 7).unwrap_err();
        assert_eq!(
            zero,
            SimError::InvalidAllocationSize {
                tag: 1,
                size: 0,
                line: Some(7)
            }
        );
    }

    #[test]
    fn test_parse_page_size() {
        assert_eq!(parse_page_size("100"), Ok(100));
        assert_eq!(parse_page_size(" 1000000\n"), Ok(1_000_000));
        assert_eq!(
            parse_page_size("0"),
            Err(SimError::InvalidPageSize { page_size: 0 })
        );
        assert_eq!(
            parse_page_size("-4"),
            Err(SimError::InvalidPageSize { page_size: -4 })
        );
        assert!(parse_page_size("1000001").is_err());
        assert!(matches!(parse_page_size("big"), Err(SimError::InvalidArgument { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Request::Allocate { tag: 1, size: 50 }.to_string(),
            "alloc tag=1 size=50"
        );
        assert_eq!(Request::Free { tag: 1 }.to_string(), "free  tag=1");
    }
}
