//! Incremental tokenization driver.
//!
//! Drives per-line tokenization forward from the invalidation frontier,
//! threading the outgoing state of each line into the next. When the state
//! arriving at a still-stored line equals the state it was last tokenized
//! with, tokenization stops early; lines below are unchanged.

use std::sync::Arc;

use crate::buffer::LineBuffer;
use crate::event::{emit_log, LogLevel};
use crate::language::{LanguageId, LanguageRegistry};
use crate::tokens::store::TokenStore;
use crate::tokens::token::LineTokens;
use crate::tokens::tokenizer::{NullState, State, Tokenizer};

/// Borrowed view tying a buffer, a registry and a token store together for
/// one tokenization pass.
pub struct TokenizationDriver<'a> {
    buffer: &'a LineBuffer,
    registry: &'a LanguageRegistry,
    language: LanguageId,
    store: &'a mut TokenStore,
}

impl<'a> TokenizationDriver<'a> {
    pub fn new(
        buffer: &'a LineBuffer,
        registry: &'a LanguageRegistry,
        language: LanguageId,
        store: &'a mut TokenStore,
    ) -> Self {
        Self {
            buffer,
            registry,
            language,
            store,
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &LineBuffer {
        self.buffer
    }

    #[must_use]
    pub fn registry(&self) -> &LanguageRegistry {
        self.registry
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.store.len()
    }

    /// Tokens of a line, tokenizing up to it first if needed.
    pub fn line_tokens(&mut self, line_idx: usize) -> Arc<LineTokens> {
        self.update_until(line_idx);
        match self.store.tokens(line_idx) {
            Some(tokens) => tokens,
            // update_until leaves every line <= line_idx valid; this arm is
            // only reachable for an index past the end of the store.
            None => Arc::new(LineTokens::whole_line(
                self.language,
                self.buffer.line_content(line_idx).len(),
            )),
        }
    }

    /// Tokenize lines from the frontier through `target_idx`, stopping early
    /// on state convergence.
    pub fn update_until(&mut self, target_idx: usize) {
        let tokenizer = self.registry.tokenizer_for(self.language);
        let line_count = self.store.len();
        let mut i = self.store.first_invalid();

        while i <= target_idx && i < line_count {
            if self.store.is_valid(i) {
                i += 1;
                continue;
            }

            let begin = match self.store.begin_state(i) {
                Some(state) => Arc::clone(state),
                None => match &tokenizer {
                    Some(t) => t.initial_state(),
                    None => Arc::new(NullState),
                },
            };
            self.store.set_begin_state(i, Arc::clone(&begin));

            let line = self.buffer.line_content(i);
            let (tokens, end_state) = self.tokenize_line(tokenizer.as_deref(), &line, &begin);
            self.store.set_tokens(i, tokens);

            i += 1;
            if i < line_count {
                let converged = self
                    .store
                    .begin_state(i)
                    .is_some_and(|next| next.eq_state(end_state.as_ref()));
                if converged {
                    // Lines below already start from this exact state; skip
                    // over the run of still-valid entries.
                    while i < line_count && self.store.is_valid(i) {
                        i += 1;
                    }
                } else {
                    self.store.set_begin_state(i, end_state);
                    self.store.mark_invalid(i);
                }
            }
        }

        self.store.advance_frontier(i);
    }

    fn tokenize_line(
        &self,
        tokenizer: Option<&dyn Tokenizer>,
        line: &str,
        begin: &State,
    ) -> (Arc<LineTokens>, State) {
        let Some(tokenizer) = tokenizer else {
            return (
                Arc::new(LineTokens::whole_line(self.language, line.len())),
                Arc::new(NullState),
            );
        };

        match tokenizer
            .tokenize_line(line, begin)
            .and_then(|out| Ok((LineTokens::new(out.tokens, line.len())?, out.end_state)))
        {
            Ok((tokens, end_state)) => (Arc::new(tokens), end_state),
            Err(e) => {
                emit_log(LogLevel::Error, &format!("tokenizer fault: {e}"));
                // Contain the fault: one code token, state passed through
                // unchanged so following lines keep tokenizing.
                (
                    Arc::new(LineTokens::whole_line(self.language, line.len())),
                    Arc::clone(begin),
                )
            }
        }
    }
}
