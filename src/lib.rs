//! `textmodel` - Tokenization-aware structural analysis for line-oriented
//! text.
//!
//! A text document is stored in a rope and tokenized one line at a time,
//! incrementally: each line's tokenizer state feeds the next line, edits
//! invalidate only forward, and re-tokenization stops as soon as states
//! converge. On top of the tokens sit the structural queries editors need:
//! bracket matching that ignores brackets inside comments and strings,
//! document-wide bracket sweeps, and indent guides.

// Crate-level lint configuration
#![warn(unsafe_code)]
#![allow(clippy::module_name_repetitions)] // Allow tokens::TokenStore etc
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference
#![allow(clippy::cast_possible_truncation)] // Language ids fit in u16 by construction
#![allow(clippy::range_plus_one)] // Explicit inclusive bounds read better here

pub mod brackets;
pub mod buffer;
pub mod error;
pub mod event;
pub mod guides;
pub mod language;
pub mod model;
pub mod position;
pub mod tokens;

// Re-export core types at crate root
pub use brackets::FoundBracket;
pub use buffer::LineBuffer;
pub use error::{Error, Result};
pub use event::{LogLevel, clear_log_callback, emit_log, set_log_callback};
pub use guides::ActiveIndentGuide;
pub use language::{CompiledBrackets, LanguageId, LanguageRegistry, Registration};
pub use model::TextModel;
pub use position::{Position, Range};
pub use tokens::{
    FnTokenizer, LineTokens, NullState, StandardTokenType, State, Token, TokenizeState,
    TokenizedLine, Tokenizer,
};
