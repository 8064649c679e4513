//! The text model: a line buffer plus incremental tokenization and the
//! structural queries built on top of it.
//!
//! A model is single-writer: queries that may need to tokenize further take
//! `&mut self`, so token state never races with edits. All line numbers and
//! columns at this surface are 1-based and validated; out-of-range input is
//! an error, never clamped.

use std::sync::Arc;

use crate::brackets::{self, FoundBracket};
use crate::buffer::LineBuffer;
use crate::error::{Error, Result};
use crate::guides::{self, ActiveIndentGuide};
use crate::language::{LanguageId, LanguageRegistry};
use crate::position::{Position, Range};
use crate::tokens::token::LineTokens;
use crate::tokens::{TokenStore, TokenizationDriver};

const DEFAULT_TAB_SIZE: usize = 4;

/// A tokenization-aware text document.
pub struct TextModel {
    buffer: LineBuffer,
    registry: LanguageRegistry,
    language: LanguageId,
    store: TokenStore,
    tab_size: usize,
}

impl TextModel {
    /// Create a model over `text`, tokenized as `language`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownLanguage`] if `language` is not registered.
    pub fn new(text: &str, registry: &LanguageRegistry, language: LanguageId) -> Result<Self> {
        if registry.language_name(language).is_none() {
            return Err(Error::UnknownLanguage(language.0));
        }
        let buffer = LineBuffer::from_str(text);
        let store = TokenStore::new(buffer.line_count());
        Ok(Self {
            buffer,
            registry: registry.clone(),
            language,
            store,
            tab_size: DEFAULT_TAB_SIZE,
        })
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    #[must_use]
    pub fn language(&self) -> LanguageId {
        self.language
    }

    #[must_use]
    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    pub fn set_tab_size(&mut self, tab_size: usize) {
        self.tab_size = tab_size.max(1);
    }

    /// Full text of the document.
    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Content of a 1-based line, without its terminator.
    ///
    /// # Errors
    /// Returns [`Error::LineOutOfBounds`] for an invalid line number.
    pub fn line_content(&self, line_number: usize) -> Result<String> {
        self.validate_line(line_number)?;
        Ok(self.buffer.line_content(line_number - 1))
    }

    /// Replace the character range `start..end` with `text`.
    ///
    /// Tokens are invalidated from the first edited line onward; lines above
    /// the edit stay untouched and lines below keep their recorded states so
    /// re-tokenization can stop as soon as states converge.
    ///
    /// # Errors
    /// Returns [`Error::EditOutOfBounds`] for an invalid character range.
    pub fn apply_edit(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        let edit = self.buffer.replace(start, end, text)?;
        self.store
            .on_edit(edit.first_line, edit.old_last_line, edit.new_last_line);
        Ok(())
    }

    /// Replace the whole content, dropping all tokenization state.
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.store.reset(self.buffer.line_count());
    }

    /// Switch the model's language and drop all tokenization state.
    ///
    /// # Errors
    /// Returns [`Error::UnknownLanguage`] if `language` is not registered.
    pub fn set_language(&mut self, language: LanguageId) -> Result<()> {
        if self.registry.language_name(language).is_none() {
            return Err(Error::UnknownLanguage(language.0));
        }
        self.language = language;
        self.store.reset(self.buffer.line_count());
        Ok(())
    }

    /// Drop all tokens and re-tokenize lazily, e.g. after tokenizer or
    /// bracket registrations changed.
    pub fn reset_tokenization(&mut self) {
        self.store.reset(self.buffer.line_count());
    }

    /// Ensure every line up to `line_number` has valid tokens.
    ///
    /// # Errors
    /// Returns [`Error::LineOutOfBounds`] for an invalid line number.
    pub fn force_tokenization(&mut self, line_number: usize) -> Result<()> {
        self.validate_line(line_number)?;
        self.driver().update_until(line_number - 1);
        Ok(())
    }

    /// Tokens of a 1-based line, tokenizing up to it first if needed.
    ///
    /// # Errors
    /// Returns [`Error::LineOutOfBounds`] for an invalid line number.
    pub fn line_tokens(&mut self, line_number: usize) -> Result<Arc<LineTokens>> {
        self.validate_line(line_number)?;
        Ok(self.driver().line_tokens(line_number - 1))
    }

    /// Find the bracket pair touching `position`:
    /// `[bracket at the position, its counterpart]`.
    ///
    /// `None` when the position touches no bracket, the bracket is
    /// unmatched, or it sits in a comment, string or regex token.
    ///
    /// # Errors
    /// Returns an error for an out-of-range position.
    pub fn match_bracket(&mut self, position: Position) -> Result<Option<(Range, Range)>> {
        self.validate_position(position)?;
        let mut driver = TokenizationDriver::new(
            &self.buffer,
            &self.registry,
            self.language,
            &mut self.store,
        );
        Ok(brackets::match_bracket(&mut driver, position))
    }

    /// First bracket starting at or after `position`.
    ///
    /// # Errors
    /// Returns an error for an out-of-range position.
    pub fn find_next_bracket(&mut self, position: Position) -> Result<Option<FoundBracket>> {
        self.validate_position(position)?;
        let mut driver = TokenizationDriver::new(
            &self.buffer,
            &self.registry,
            self.language,
            &mut self.store,
        );
        Ok(brackets::find_next_bracket(&mut driver, position))
    }

    /// Last bracket ending at or before `position`.
    ///
    /// # Errors
    /// Returns an error for an out-of-range position.
    pub fn find_prev_bracket(&mut self, position: Position) -> Result<Option<FoundBracket>> {
        self.validate_position(position)?;
        let mut driver = TokenizationDriver::new(
            &self.buffer,
            &self.registry,
            self.language,
            &mut self.store,
        );
        Ok(brackets::find_prev_bracket(&mut driver, position))
    }

    /// Indent guide levels for the 1-based inclusive line range.
    ///
    /// # Errors
    /// Returns [`Error::LineOutOfBounds`] for an invalid range.
    pub fn lines_indent_guides(&self, start_line: usize, end_line: usize) -> Result<Vec<usize>> {
        self.validate_line(start_line)?;
        self.validate_line(end_line)?;
        if end_line < start_line {
            return Ok(Vec::new());
        }
        Ok(guides::lines_indent_guides(
            &self.buffer,
            self.tab_size,
            start_line,
            end_line,
        ))
    }

    /// The indent block containing `line_number`, with the lookaround
    /// bounded by `min_line..=max_line`.
    ///
    /// # Errors
    /// Returns [`Error::LineOutOfBounds`] for an invalid line number.
    pub fn active_indent_guide(
        &self,
        line_number: usize,
        min_line: usize,
        max_line: usize,
    ) -> Result<ActiveIndentGuide> {
        self.validate_line(line_number)?;
        self.validate_line(min_line)?;
        self.validate_line(max_line)?;
        Ok(guides::active_indent_guide(
            &self.buffer,
            self.tab_size,
            line_number,
            min_line,
            max_line,
        ))
    }

    fn driver(&mut self) -> TokenizationDriver<'_> {
        TokenizationDriver::new(
            &self.buffer,
            &self.registry,
            self.language,
            &mut self.store,
        )
    }

    fn validate_line(&self, line_number: usize) -> Result<()> {
        let line_count = self.buffer.line_count();
        if line_number < 1 || line_number > line_count {
            return Err(Error::LineOutOfBounds {
                line_number,
                line_count,
            });
        }
        Ok(())
    }

    fn validate_position(&self, position: Position) -> Result<()> {
        self.validate_line(position.line_number)?;
        let line_length = self.buffer.line_content(position.line_number - 1).len();
        if position.column < 1 || position.column > line_length + 1 {
            return Err(Error::ColumnOutOfBounds {
                line_number: position.line_number,
                column: position.column,
                line_length,
            });
        }
        Ok(())
    }
}
