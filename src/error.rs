//! Error types for the text model core.

use std::fmt;

/// Result type alias for text model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for text model operations.
///
/// Structural absence (no bracket at a position, no matching counterpart) is
/// never an error; those queries return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Line number outside `1..=line_count`.
    LineOutOfBounds { line_number: usize, line_count: usize },
    /// Column outside `1..=line_length + 1`.
    ColumnOutOfBounds {
        line_number: usize,
        column: usize,
        line_length: usize,
    },
    /// Edit character range outside the buffer.
    EditOutOfBounds { start: usize, end: usize, len: usize },
    /// Bracket pair declaration with an empty open or close text.
    InvalidBracketPair { open: String, close: String },
    /// Bracket pair declared twice for the same language.
    DuplicateBracketPair { open: String, close: String },
    /// Language id not present in the registry.
    UnknownLanguage(u16),
    /// A registered tokenizer failed for a line. Contained by the driver;
    /// only tokenizer implementations return this.
    Tokenizer(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineOutOfBounds {
                line_number,
                line_count,
            } => {
                write!(f, "line {line_number} out of bounds (1..={line_count})")
            }
            Self::ColumnOutOfBounds {
                line_number,
                column,
                line_length,
            } => {
                write!(
                    f,
                    "column {column} out of bounds on line {line_number} (1..={})",
                    line_length + 1
                )
            }
            Self::EditOutOfBounds { start, end, len } => {
                write!(f, "edit range {start}..{end} out of bounds for length {len}")
            }
            Self::InvalidBracketPair { open, close } => {
                write!(f, "invalid bracket pair ({open:?}, {close:?}): empty text")
            }
            Self::DuplicateBracketPair { open, close } => {
                write!(f, "duplicate bracket pair ({open:?}, {close:?})")
            }
            Self::UnknownLanguage(id) => write!(f, "unknown language id {id}"),
            Self::Tokenizer(msg) => write!(f, "tokenizer failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
