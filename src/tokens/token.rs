//! Token types produced by line tokenization.

use crate::error::{Error, Result};
use crate::language::LanguageId;

/// Standard classification of a token, used to decide whether text
/// participates in bracket matching. Only `Other` (code) tokens do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StandardTokenType {
    #[default]
    Other,
    Comment,
    String,
    Regex,
}

impl StandardTokenType {
    /// True if brackets inside this token are ignored.
    #[must_use]
    pub fn ignores_brackets(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// A single token within a line: start offset plus classification.
///
/// A token's end offset is implied by the start of the next token (or the
/// line length for the last token); tokens for a line are contiguous and
/// cover the whole line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub token_type: StandardTokenType,
    pub language: LanguageId,
}

impl Token {
    #[must_use]
    pub fn new(start: usize, token_type: StandardTokenType, language: LanguageId) -> Self {
        Self {
            start,
            token_type,
            language,
        }
    }
}

/// The ordered token sequence of one line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineTokens {
    tokens: Vec<Token>,
    line_length: usize,
}

impl LineTokens {
    /// Build a validated token sequence for a line.
    ///
    /// # Errors
    /// Fails if the sequence is empty, does not start at offset 0, has
    /// decreasing start offsets, or starts a token past the line end.
    pub fn new(tokens: Vec<Token>, line_length: usize) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::Tokenizer("empty token sequence".to_string()));
        }
        if tokens[0].start != 0 {
            return Err(Error::Tokenizer(format!(
                "first token starts at {}, expected 0",
                tokens[0].start
            )));
        }
        for pair in tokens.windows(2) {
            if pair[1].start < pair[0].start {
                return Err(Error::Tokenizer("token starts must be sorted".to_string()));
            }
        }
        if let Some(last) = tokens.last() {
            if last.start > line_length {
                return Err(Error::Tokenizer(format!(
                    "token start {} past line length {line_length}",
                    last.start
                )));
            }
        }
        Ok(Self {
            tokens,
            line_length,
        })
    }

    /// One `Other` token spanning the whole line, the fallback for
    /// unregistered languages and tokenizer faults.
    #[must_use]
    pub fn whole_line(language: LanguageId, line_length: usize) -> Self {
        Self {
            tokens: vec![Token::new(0, StandardTokenType::Other, language)],
            line_length,
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn line_length(&self) -> usize {
        self.line_length
    }

    #[must_use]
    pub fn start_offset(&self, index: usize) -> usize {
        self.tokens[index].start
    }

    #[must_use]
    pub fn end_offset(&self, index: usize) -> usize {
        self.tokens
            .get(index + 1)
            .map_or(self.line_length, |t| t.start)
    }

    #[must_use]
    pub fn token_type(&self, index: usize) -> StandardTokenType {
        self.tokens[index].token_type
    }

    #[must_use]
    pub fn language(&self, index: usize) -> LanguageId {
        self.tokens[index].language
    }

    /// Index of the token containing `offset`. Offsets at a token boundary
    /// belong to the token starting there; an offset at or past the line end
    /// belongs to the last token.
    #[must_use]
    pub fn index_at_offset(&self, offset: usize) -> usize {
        // Greatest index whose start is <= offset.
        let mut lo = 0;
        let mut hi = self.tokens.len() - 1;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.tokens[mid].start <= offset {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }
}
