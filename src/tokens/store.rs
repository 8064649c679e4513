//! Per-line token and tokenization state bookkeeping.
//!
//! The store keeps, for every line, the tokens last computed for it, the
//! state the tokenizer was seeded with (the *begin* state, equal to the
//! previous line's outgoing state), and a validity flag. Invalidation is
//! forward-transitive only: an edit to line *n* never touches lines above it.

use std::sync::Arc;

use crate::tokens::token::LineTokens;
use crate::tokens::tokenizer::State;

/// Answer to a state query.
#[derive(Clone, Debug)]
pub enum StateQuery {
    /// The line's begin state is valid.
    Valid(State),
    /// The line must be (re-)tokenized before its state can be observed.
    NeedsTokenization,
}

#[derive(Clone, Debug, Default)]
struct LineEntry {
    /// State the line's tokenization starts from; kept even while invalid,
    /// it is the comparand for convergence detection.
    begin_state: Option<State>,
    tokens: Option<Arc<LineTokens>>,
    valid: bool,
}

/// Token and state storage for one document.
#[derive(Debug, Default)]
pub struct TokenStore {
    entries: Vec<LineEntry>,
    /// Index of the first line whose tokens are not known to be valid.
    first_invalid: usize,
}

impl TokenStore {
    #[must_use]
    pub fn new(line_count: usize) -> Self {
        Self {
            entries: vec![LineEntry::default(); line_count],
            first_invalid: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first line that needs tokenization.
    #[must_use]
    pub fn first_invalid(&self) -> usize {
        self.first_invalid
    }

    #[must_use]
    pub fn is_valid(&self, line_idx: usize) -> bool {
        self.entries.get(line_idx).is_some_and(|e| e.valid)
    }

    /// Begin state of a line, if it has been tokenized and is still valid.
    #[must_use]
    pub fn state(&self, line_idx: usize) -> StateQuery {
        match self.entries.get(line_idx) {
            Some(entry) if entry.valid => match &entry.begin_state {
                Some(state) => StateQuery::Valid(Arc::clone(state)),
                None => StateQuery::NeedsTokenization,
            },
            _ => StateQuery::NeedsTokenization,
        }
    }

    /// Stored begin state regardless of validity (the convergence comparand).
    #[must_use]
    pub(crate) fn begin_state(&self, line_idx: usize) -> Option<&State> {
        self.entries.get(line_idx)?.begin_state.as_ref()
    }

    #[must_use]
    pub(crate) fn tokens(&self, line_idx: usize) -> Option<Arc<LineTokens>> {
        let entry = self.entries.get(line_idx)?;
        if entry.valid {
            entry.tokens.as_ref().map(Arc::clone)
        } else {
            None
        }
    }

    /// Record the result of tokenizing `line_idx`.
    pub(crate) fn set_tokens(&mut self, line_idx: usize, tokens: Arc<LineTokens>) {
        let entry = &mut self.entries[line_idx];
        entry.tokens = Some(tokens);
        entry.valid = true;
    }

    pub(crate) fn set_begin_state(&mut self, line_idx: usize, state: State) {
        if let Some(entry) = self.entries.get_mut(line_idx) {
            entry.begin_state = Some(state);
        }
    }

    pub(crate) fn mark_invalid(&mut self, line_idx: usize) {
        if let Some(entry) = self.entries.get_mut(line_idx) {
            entry.valid = false;
        }
        self.first_invalid = self.first_invalid.min(line_idx);
    }

    pub(crate) fn advance_frontier(&mut self, line_idx: usize) {
        self.first_invalid = line_idx;
    }

    /// Invalidate every line from `line_idx` to the end of the document.
    pub fn invalidate_from(&mut self, line_idx: usize) {
        for entry in self.entries.iter_mut().skip(line_idx) {
            entry.valid = false;
        }
        self.first_invalid = self.first_invalid.min(line_idx);
    }

    /// Drop all tokens and states, e.g. after a language switch.
    pub fn reset(&mut self, line_count: usize) {
        self.entries = vec![LineEntry::default(); line_count];
        self.first_invalid = 0;
    }

    /// Apply an edit's affected line range (0-based, inclusive).
    ///
    /// Entries for edited lines are replaced and marked invalid; the first
    /// edited line keeps its begin state (it is produced by the line above,
    /// which the edit did not touch), and entries below the edit keep theirs
    /// so convergence can be detected at the edit's lower boundary.
    pub fn on_edit(&mut self, first_line: usize, old_last_line: usize, new_last_line: usize) {
        let len = self.entries.len();
        let first = first_line.min(len.saturating_sub(1));
        let old_last = old_last_line.min(len.saturating_sub(1));

        let kept_begin = self.entries.get(first).and_then(|e| e.begin_state.clone());
        let replacement = (new_last_line - first_line + 1).max(1);
        let mut fresh = vec![LineEntry::default(); replacement];
        fresh[0].begin_state = kept_begin;
        self.entries.splice(first..=old_last, fresh);

        self.first_invalid = self.first_invalid.min(first);
    }
}
