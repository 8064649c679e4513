//! Positions and ranges in a line-oriented document.
//!
//! Line numbers and columns are 1-based. A column is a byte offset into the
//! line's UTF-8 content plus one, so column 1 is before the first byte and
//! column `len + 1` is after the last. A single-width cursor sits *between*
//! columns, which is why bracket queries treat a position as touching the
//! token on either side.

use std::fmt;

/// A position in the document: 1-based line number and column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line_number: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub fn new(line_number: usize, column: usize) -> Self {
        Self {
            line_number,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line_number, self.column)
    }
}

/// A range in the document, half-open on the column axis
/// (`end_column` exclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_line_number: usize,
    pub start_column: usize,
    pub end_line_number: usize,
    pub end_column: usize,
}

impl Range {
    #[must_use]
    pub fn new(
        start_line_number: usize,
        start_column: usize,
        end_line_number: usize,
        end_column: usize,
    ) -> Self {
        Self {
            start_line_number,
            start_column,
            end_line_number,
            end_column,
        }
    }

    #[must_use]
    pub fn start(&self) -> Position {
        Position::new(self.start_line_number, self.start_column)
    }

    #[must_use]
    pub fn end(&self) -> Position {
        Position::new(self.end_line_number, self.end_column)
    }

    /// True if the range covers no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_line_number == self.end_line_number && self.start_column == self.end_column
    }

    /// True if `position` is inside or on the edges of the range.
    #[must_use]
    pub fn contains_position(&self, position: Position) -> bool {
        let p = (position.line_number, position.column);
        p >= (self.start_line_number, self.start_column)
            && p <= (self.end_line_number, self.end_column)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{} -> {},{}]",
            self.start_line_number, self.start_column, self.end_line_number, self.end_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 9) < Position::new(2, 1));
        assert!(Position::new(3, 4) < Position::new(3, 5));
    }

    #[test]
    fn test_range_contains() {
        let range = Range::new(1, 4, 1, 5);
        assert!(range.contains_position(Position::new(1, 4)));
        assert!(range.contains_position(Position::new(1, 5)));
        assert!(!range.contains_position(Position::new(1, 6)));
        assert!(!range.contains_position(Position::new(2, 4)));
    }

    #[test]
    fn test_range_accessors() {
        let range = Range::new(2, 3, 4, 1);
        assert_eq!(range.start(), Position::new(2, 3));
        assert_eq!(range.end(), Position::new(4, 1));
        assert!(!range.is_empty());
        assert!(Range::new(1, 1, 1, 1).is_empty());
    }
}
