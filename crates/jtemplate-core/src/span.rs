//! Source location tracking for error reporting.
//!
//! Provides [`Span`] to track where tokens, placeholders and errors occur in
//! source code or template text.

use std::fmt;

/// A span of source code.
///
/// Tracks the 1-indexed line:column where the span starts together with its
/// byte offset and byte length, so spans can be merged exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset from the start of the source.
    pub offset: u32,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub fn new(offset: u32, line: u32, col: u32, len: u32) -> Self {
        Self {
            offset,
            line,
            col,
            len,
        }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(offset: u32, line: u32, col: u32) -> Self {
        Self {
            offset,
            line,
            col,
            len: 0,
        }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Byte offset one past the end of the span.
    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.len
    }

    /// Merge two spans into the smallest span covering both.
    ///
    /// Line and column are taken from whichever span starts first.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        let (first, _) = if self.offset <= other.offset {
            (self, other)
        } else {
            (other, self)
        };
        let end = self.end().max(other.end());
        Span {
            offset: first.offset,
            line: first.line,
            col: first.col,
            len: end - first.offset,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(4, 1, 5, 10);
        assert_eq!(span.len(), 10);
        assert_eq!(span.end(), 14);
        assert!(!span.is_empty());

        let empty = Span::point(4, 1, 5);
        assert!(empty.is_empty());
    }

    #[test]
    fn span_display() {
        let span = Span::new(40, 3, 15, 5);
        assert_eq!(format!("{}", span), "3:15");
    }

    #[test]
    fn span_merge_disjoint() {
        let foo = Span::new(4, 1, 5, 3);
        let bar = Span::new(9, 1, 10, 3);
        let merged = foo.merge(bar);

        assert_eq!(merged.col, 5);
        assert_eq!(merged.offset, 4);
        assert_eq!(merged.len, 8);
    }

    #[test]
    fn span_merge_reverse_order() {
        let later = Span::new(20, 2, 3, 4);
        let earlier = Span::new(2, 1, 3, 2);
        let merged = later.merge(earlier);

        assert_eq!(merged.line, 1);
        assert_eq!(merged.offset, 2);
        assert_eq!(merged.len, 22);
    }

    #[test]
    fn span_merge_with_point() {
        let span = Span::new(4, 1, 5, 10);
        let point = Span::point(7, 1, 8);
        assert_eq!(span.merge(point), span);
    }
}
