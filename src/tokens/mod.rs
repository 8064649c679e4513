//! Line tokenization: token types, tokenizer trait, storage and the
//! incremental driver.

pub mod driver;
pub mod store;
pub mod token;
pub mod tokenizer;

pub use driver::TokenizationDriver;
pub use store::{StateQuery, TokenStore};
pub use token::{LineTokens, StandardTokenType, Token};
pub use tokenizer::{FnTokenizer, NullState, State, TokenizeState, TokenizedLine, Tokenizer};
