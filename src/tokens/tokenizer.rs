//! Tokenizer abstraction and the per-line carry-over state.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::tokens::token::Token;

/// Opaque tokenization state carried from one line to the next.
///
/// States are equality-comparable so the driver can detect convergence: when
/// re-tokenizing a line produces the same outgoing state as before, the lines
/// below are still valid. Implementations downcast through [`Any`]:
///
/// ```ignore
/// impl TokenizeState for MyState {
///     fn as_any(&self) -> &dyn Any { self }
///     fn eq_state(&self, other: &dyn TokenizeState) -> bool {
///         other.as_any().downcast_ref::<Self>() == Some(self)
///     }
/// }
/// ```
pub trait TokenizeState: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_state(&self, other: &dyn TokenizeState) -> bool;
}

/// Shared handle to a tokenization state snapshot.
pub type State = Arc<dyn TokenizeState>;

/// The state of a stateless tokenizer, and the carry-over used by the
/// whole-line fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct NullState;

impl TokenizeState for NullState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_state(&self, other: &dyn TokenizeState) -> bool {
        other.as_any().downcast_ref::<Self>().is_some()
    }
}

/// Result of tokenizing one line.
#[derive(Clone, Debug)]
pub struct TokenizedLine {
    /// Tokens covering the line, left to right, first start offset 0.
    pub tokens: Vec<Token>,
    /// State handed to the next line.
    pub end_state: State,
}

/// Per-language line tokenizer.
///
/// A tokenizer never sees more than one line at a time; multi-line constructs
/// are carried through the returned state. Errors are contained by the driver
/// (the line falls back to a single code token) and reported via the log
/// callback, so a faulty tokenizer cannot take down the document.
pub trait Tokenizer: Send + Sync {
    /// State fed to the first line of the document.
    fn initial_state(&self) -> State;

    /// Tokenize a single line given the state from the previous line.
    fn tokenize_line(&self, line: &str, state: &State) -> Result<TokenizedLine>;
}

type TokenizeFn = dyn Fn(&str, &State) -> Result<TokenizedLine> + Send + Sync;

/// Closure-backed [`Tokenizer`], convenient for tests and simple grammars.
pub struct FnTokenizer {
    initial: State,
    tokenize: Box<TokenizeFn>,
}

impl FnTokenizer {
    #[must_use]
    pub fn new<F>(initial: State, tokenize: F) -> Self
    where
        F: Fn(&str, &State) -> Result<TokenizedLine> + Send + Sync + 'static,
    {
        Self {
            initial,
            tokenize: Box::new(tokenize),
        }
    }
}

impl Tokenizer for FnTokenizer {
    fn initial_state(&self) -> State {
        Arc::clone(&self.initial)
    }

    fn tokenize_line(&self, line: &str, state: &State) -> Result<TokenizedLine> {
        (self.tokenize)(line, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageId;
    use crate::tokens::token::StandardTokenType;

    #[derive(Debug, PartialEq, Eq)]
    struct Depth(u8);

    impl TokenizeState for Depth {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn eq_state(&self, other: &dyn TokenizeState) -> bool {
            other.as_any().downcast_ref::<Self>() == Some(self)
        }
    }

    #[test]
    fn test_state_equality_downcasts() {
        let a: State = Arc::new(Depth(1));
        let b: State = Arc::new(Depth(1));
        let c: State = Arc::new(Depth(2));
        let null: State = Arc::new(NullState);

        assert!(a.eq_state(b.as_ref()));
        assert!(!a.eq_state(c.as_ref()));
        assert!(!a.eq_state(null.as_ref()));
        assert!(null.eq_state(Arc::new(NullState).as_ref()));
    }

    #[test]
    fn test_fn_tokenizer() {
        let lang = LanguageId(0);
        let tokenizer = FnTokenizer::new(Arc::new(NullState), move |_line, state| {
            Ok(TokenizedLine {
                tokens: vec![Token::new(0, StandardTokenType::Other, lang)],
                end_state: Arc::clone(state),
            })
        });

        let state = tokenizer.initial_state();
        let result = tokenizer.tokenize_line("abc", &state).unwrap();
        assert_eq!(result.tokens.len(), 1);
        assert!(result.end_state.eq_state(state.as_ref()));
    }
}
