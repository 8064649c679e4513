//! Language identities and per-language registrations: tokenizers and
//! bracket definitions.

pub mod brackets;
pub mod registry;

pub use brackets::{BracketFamily, BracketToken, CompiledBrackets};
pub use registry::{LanguageRegistry, Registration};

/// Interned language identity.
///
/// Identities are handed out by [`LanguageRegistry::register_language`] and
/// carried on every token, so a single document can mix languages line by
/// line or token by token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageId(pub u16);
