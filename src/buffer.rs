//! Rope-backed line buffer.
//!
//! The structural analysis engine only consumes the buffer's line-oriented
//! read contract (`line_count`, `line_content`) plus the affected line range
//! of each edit; [`LineBuffer`] provides exactly that on top of `ropey`.

use ropey::Rope;

use crate::error::{Error, Result};

/// Line range affected by an edit, 0-based inclusive indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditRange {
    /// First line touched by the edit.
    pub first_line: usize,
    /// Last touched line before the edit was applied.
    pub old_last_line: usize,
    /// Last touched line after the edit was applied.
    pub new_last_line: usize,
}

/// Rope-backed text storage with line access.
#[derive(Clone, Debug, Default)]
pub struct LineBuffer {
    rope: Rope,
}

impl LineBuffer {
    /// Create an empty buffer (one empty line).
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a buffer from initial text.
    #[must_use]
    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Number of lines. An empty buffer has one line; a trailing newline
    /// starts another.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Number of characters.
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Content of a 0-based line, without its line terminator.
    #[must_use]
    pub fn line_content(&self, line_idx: usize) -> String {
        if line_idx >= self.rope.len_lines() {
            return String::new();
        }
        let line = self.rope.line(line_idx).to_string();
        line.trim_end_matches(['\n', '\r']).to_string()
    }

    /// Replace the character range `start..end` with `text`, returning the
    /// affected line range.
    ///
    /// # Errors
    /// Returns [`Error::EditOutOfBounds`] for an invalid character range.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<EditRange> {
        let len = self.rope.len_chars();
        if start > end || end > len {
            return Err(Error::EditOutOfBounds { start, end, len });
        }
        let first_line = self.rope.char_to_line(start);
        let old_last_line = self.rope.char_to_line(end);
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        let new_last_line = self.rope.char_to_line(start + text.chars().count());
        Ok(EditRange {
            first_line,
            old_last_line,
            new_last_line,
        })
    }

    /// Replace the whole content.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Character index at the start of a 0-based line.
    #[must_use]
    pub fn line_to_char(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            self.rope.len_chars()
        } else {
            self.rope.line_to_char(line_idx)
        }
    }

    /// Full text as a string.
    #[must_use]
    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

impl From<&str> for LineBuffer {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}
