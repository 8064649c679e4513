//! Language registry: interned language names plus per-language tokenizers
//! and bracket definitions.

use std::sync::{Arc, Mutex, Weak};

use crate::error::{Error, Result};
use crate::language::brackets::CompiledBrackets;
use crate::language::LanguageId;
use crate::tokens::tokenizer::Tokenizer;

#[derive(Default)]
struct LanguageSlot {
    name: String,
    tokenizer: Option<(Arc<dyn Tokenizer>, u64)>,
    brackets: Option<(Arc<CompiledBrackets>, u64)>,
}

#[derive(Default)]
struct Inner {
    languages: Vec<LanguageSlot>,
    generation: u64,
}

/// Shared registry of languages and their registrations.
///
/// Cloning is cheap; clones observe the same registrations. Mutation goes
/// through a mutex, so registration can happen from any thread while models
/// read concurrently.
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Clone, Copy, Debug)]
enum RegistrationKind {
    Tokenizer,
    Brackets,
}

/// Handle keeping a tokenizer or bracket registration alive.
///
/// Dropping the handle removes the registration, unless a newer one has
/// replaced it in the meantime.
pub struct Registration {
    registry: Weak<Mutex<Inner>>,
    language: LanguageId,
    kind: RegistrationKind,
    generation: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let Ok(mut inner) = inner.lock() else {
            return;
        };
        let Some(slot) = inner.languages.get_mut(self.language.0 as usize) else {
            return;
        };
        match self.kind {
            RegistrationKind::Tokenizer => {
                if slot.tokenizer.as_ref().is_some_and(|(_, g)| *g == self.generation) {
                    slot.tokenizer = None;
                }
            }
            RegistrationKind::Brackets => {
                if slot.brackets.as_ref().is_some_and(|(_, g)| *g == self.generation) {
                    slot.brackets = None;
                }
            }
        }
    }
}

impl LanguageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a language name, returning its identity. Registering the same
    /// name twice returns the same identity.
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn register_language(&self, name: &str) -> LanguageId {
        let mut inner = self.lock();
        if let Some(idx) = inner.languages.iter().position(|s| s.name == name) {
            return LanguageId(idx as u16);
        }
        inner.languages.push(LanguageSlot {
            name: name.to_string(),
            ..LanguageSlot::default()
        });
        LanguageId((inner.languages.len() - 1) as u16)
    }

    /// Name of a registered language.
    #[must_use]
    pub fn language_name(&self, id: LanguageId) -> Option<String> {
        self.lock()
            .languages
            .get(id.0 as usize)
            .map(|s| s.name.clone())
    }

    /// Attach a tokenizer to a language, replacing any previous one.
    ///
    /// # Errors
    /// Returns [`Error::UnknownLanguage`] for an unregistered identity.
    pub fn register_tokenizer(
        &self,
        id: LanguageId,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Registration> {
        let mut inner = self.lock();
        inner.generation += 1;
        let generation = inner.generation;
        let slot = inner
            .languages
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownLanguage(id.0))?;
        slot.tokenizer = Some((tokenizer, generation));
        Ok(Registration {
            registry: Arc::downgrade(&self.inner),
            language: id,
            kind: RegistrationKind::Tokenizer,
            generation,
        })
    }

    /// Attach bracket pairs to a language, replacing any previous set.
    ///
    /// # Errors
    /// Fails for an unregistered identity or invalid pairs (see
    /// [`CompiledBrackets::compile`]).
    pub fn register_bracket_pairs(
        &self,
        id: LanguageId,
        pairs: &[(&str, &str)],
    ) -> Result<Registration> {
        let compiled = Arc::new(CompiledBrackets::compile(pairs)?);
        let mut inner = self.lock();
        inner.generation += 1;
        let generation = inner.generation;
        let slot = inner
            .languages
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownLanguage(id.0))?;
        slot.brackets = Some((compiled, generation));
        Ok(Registration {
            registry: Arc::downgrade(&self.inner),
            language: id,
            kind: RegistrationKind::Brackets,
            generation,
        })
    }

    #[must_use]
    pub fn tokenizer_for(&self, id: LanguageId) -> Option<Arc<dyn Tokenizer>> {
        self.lock()
            .languages
            .get(id.0 as usize)?
            .tokenizer
            .as_ref()
            .map(|(t, _)| Arc::clone(t))
    }

    #[must_use]
    pub fn brackets_for(&self, id: LanguageId) -> Option<Arc<CompiledBrackets>> {
        self.lock()
            .languages
            .get(id.0 as usize)?
            .brackets
            .as_ref()
            .map(|(b, _)| Arc::clone(b))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::tokenizer::{FnTokenizer, NullState, TokenizedLine};
    use crate::tokens::token::{StandardTokenType, Token};

    fn noop_tokenizer(lang: LanguageId) -> Arc<dyn Tokenizer> {
        Arc::new(FnTokenizer::new(Arc::new(NullState), move |_, state| {
            Ok(TokenizedLine {
                tokens: vec![Token::new(0, StandardTokenType::Other, lang)],
                end_state: Arc::clone(state),
            })
        }))
    }

    #[test]
    fn test_register_language_is_idempotent() {
        let registry = LanguageRegistry::new();
        let a = registry.register_language("rust");
        let b = registry.register_language("toml");
        let c = registry.register_language("rust");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(registry.language_name(a).as_deref(), Some("rust"));
    }

    #[test]
    fn test_unknown_language_rejected() {
        let registry = LanguageRegistry::new();
        assert!(matches!(
            registry.register_bracket_pairs(LanguageId(7), &[("(", ")")]),
            Err(Error::UnknownLanguage(7))
        ));
        assert!(registry
            .register_tokenizer(LanguageId(7), noop_tokenizer(LanguageId(7)))
            .is_err());
    }

    #[test]
    fn test_registration_drop_removes() {
        let registry = LanguageRegistry::new();
        let lang = registry.register_language("test");
        let reg = registry
            .register_bracket_pairs(lang, &[("(", ")")])
            .unwrap();
        assert!(registry.brackets_for(lang).is_some());
        drop(reg);
        assert!(registry.brackets_for(lang).is_none());
    }

    #[test]
    fn test_stale_registration_drop_is_a_noop() {
        let registry = LanguageRegistry::new();
        let lang = registry.register_language("test");
        let old = registry
            .register_bracket_pairs(lang, &[("(", ")")])
            .unwrap();
        let new = registry
            .register_bracket_pairs(lang, &[("{", "}")])
            .unwrap();
        drop(old);
        assert!(registry.brackets_for(lang).is_some());
        drop(new);
        assert!(registry.brackets_for(lang).is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = LanguageRegistry::new();
        let clone = registry.clone();
        let lang = registry.register_language("shared");
        let _reg = clone.register_bracket_pairs(lang, &[("(", ")")]).unwrap();
        assert!(registry.brackets_for(lang).is_some());
    }
}
