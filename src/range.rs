use std::fmt;

use crate::error::{Error, Result};

/// A contiguous run of words inside the arena.
///
/// A range covers the half-open interval `[base, base + length)`. Ranges are
/// plain values: the allocator never mutates one, it replaces it.
///
/// ```text
///   base                      base + length
///    |                              |
///    v                              v
/// ---+------------------------------+---
///    |   length words (in use or    |
///    |   free, depending on list)   |
/// ---+------------------------------+---
/// ```
///
/// Two ranges are equal when both their base and their length are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// First address of the range.
    base: usize,
    /// Number of words covered. Never zero.
    length: usize,
}

impl Range {
    /// Creates the range `[base, base + length)`.
    ///
    /// Fails with [`Error::InvalidArgument`] if `length` is zero or the end of
    /// the range does not fit in a `usize`.
    pub fn new(base: usize, length: usize) -> Result<Self> {
        if length == 0 {
            return Err(Error::InvalidArgument(
                "range length must be greater than zero".into(),
            ));
        }
        if base.checked_add(length).is_none() {
            return Err(Error::InvalidArgument(format!(
                "range at {base} with length {length} overflows the address space"
            )));
        }

        Ok(Self { base, length })
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// One past the last address of the range.
    #[inline]
    pub fn end(&self) -> usize {
        self.base + self.length
    }

    #[inline]
    pub fn contains(&self, address: usize) -> bool {
        self.base <= address && address < self.end()
    }

    /// Whether both ranges share at least one address.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.base < other.end() && other.base < self.end()
    }

    /// Whether `other` starts exactly where this range ends.
    pub fn touches(&self, other: &Range) -> bool {
        self.end() == other.base
    }

    /// Splits off the first `length` words.
    ///
    /// Returns the taken head and whatever remains after it. The remainder is
    /// `None` when `length` consumes the whole range, so a zero-length range is
    /// never built. Callers guarantee `0 < length <= self.length`.
    pub(crate) fn split_at(&self, length: usize) -> (Range, Option<Range>) {
        debug_assert!(length > 0 && length <= self.length);

        let head = Range {
            base: self.base,
            length,
        };
        let rest = (length < self.length).then(|| Range {
            base: self.base + length,
            length: self.length - length,
        });

        (head, rest)
    }

    /// Extends this range with a touching successor.
    pub(crate) fn absorb(&mut self, next: &Range) {
        debug_assert!(self.touches(next));
        self.length += next.length;
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} , {})", self.base, self.length)
    }
}
