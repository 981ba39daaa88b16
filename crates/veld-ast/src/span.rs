//! Source spans

use std::fmt;

/// A half-open byte range into the source text, plus the 1-indexed line and
/// column of its start. Produced by the parser; carried on every AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: u32,
    /// Byte offset one past the last character.
    pub end: u32,
    /// Line of `start` (1-indexed).
    pub line: u32,
    /// Column of `start` (1-indexed).
    pub column: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Span { start, end, line, column }
    }

    /// A zero-width span at the origin, for synthesized nodes.
    pub fn dummy() -> Self {
        Span::new(0, 0, 1, 1)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let (line, column) = if self.start <= other.start {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_earliest_position() {
        let a = Span::new(10, 20, 2, 3);
        let b = Span::new(5, 12, 1, 6);
        let m = a.merge(b);
        assert_eq!(m.start, 5);
        assert_eq!(m.end, 20);
        assert_eq!(m.line, 1);
        assert_eq!(m.column, 6);
    }
}
