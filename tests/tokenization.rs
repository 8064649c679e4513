//! Incremental tokenization through the model: multi-line state carry-over,
//! convergence after edits, and language switching.

use std::any::Any;
use std::sync::Arc;

use textmodel::{
    LanguageId, LanguageRegistry, Position, Range, Registration, Result, StandardTokenType, State,
    TextModel, Token, TokenizeState, TokenizedLine, Tokenizer,
};

/// Carry-over for [`ToyTokenizer`]: whether a `/* ... */` comment is open.
#[derive(Debug, PartialEq, Eq)]
struct CommentState {
    in_comment: bool,
}

impl TokenizeState for CommentState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_state(&self, other: &dyn TokenizeState) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
}

/// Minimal stateful tokenizer: everything inside `/* ... */` is a comment
/// token, everything else is code.
struct ToyTokenizer {
    lang: LanguageId,
}

impl Tokenizer for ToyTokenizer {
    fn initial_state(&self) -> State {
        Arc::new(CommentState { in_comment: false })
    }

    fn tokenize_line(&self, line: &str, state: &State) -> Result<TokenizedLine> {
        let mut in_comment = state
            .as_any()
            .downcast_ref::<CommentState>()
            .is_some_and(|s| s.in_comment);
        let bytes = line.as_bytes();
        let mut tokens = Vec::new();
        let mut seg_start = 0;
        let mut i = 0;
        while i < bytes.len() {
            if in_comment {
                if bytes[i..].starts_with(b"*/") {
                    i += 2;
                    tokens.push(Token::new(seg_start, StandardTokenType::Comment, self.lang));
                    seg_start = i;
                    in_comment = false;
                } else {
                    i += 1;
                }
            } else if bytes[i..].starts_with(b"/*") {
                if i > seg_start {
                    tokens.push(Token::new(seg_start, StandardTokenType::Other, self.lang));
                }
                seg_start = i;
                in_comment = true;
                i += 2;
            } else {
                i += 1;
            }
        }
        if seg_start < bytes.len() || tokens.is_empty() {
            let token_type = if in_comment {
                StandardTokenType::Comment
            } else {
                StandardTokenType::Other
            };
            tokens.push(Token::new(seg_start, token_type, self.lang));
        }
        Ok(TokenizedLine {
            tokens,
            end_state: Arc::new(CommentState { in_comment }),
        })
    }
}

fn toy_model(text: &str) -> (TextModel, LanguageRegistry, LanguageId, Registration) {
    let registry = LanguageRegistry::new();
    let lang = registry.register_language("toy");
    let reg = registry
        .register_tokenizer(lang, Arc::new(ToyTokenizer { lang }))
        .unwrap();
    let model = TextModel::new(text, &registry, lang).unwrap();
    (model, registry, lang, reg)
}

#[test]
fn test_comment_state_crosses_lines() {
    let (mut model, _registry, _lang, _reg) = toy_model("a /* b\nc\n*/ d");

    let line1 = model.line_tokens(1).unwrap();
    assert_eq!(line1.count(), 2);
    assert_eq!(line1.token_type(0), StandardTokenType::Other);
    assert_eq!(line1.token_type(1), StandardTokenType::Comment);
    assert_eq!(line1.start_offset(1), 2);

    let line2 = model.line_tokens(2).unwrap();
    assert_eq!(line2.count(), 1);
    assert_eq!(line2.token_type(0), StandardTokenType::Comment);

    let line3 = model.line_tokens(3).unwrap();
    assert_eq!(line3.count(), 2);
    assert_eq!(line3.token_type(0), StandardTokenType::Comment);
    assert_eq!(line3.token_type(1), StandardTokenType::Other);
    assert_eq!(line3.start_offset(1), 2);
}

#[test]
fn test_edit_converges_without_retokenizing_tail() {
    let (mut model, _registry, _lang, _reg) = toy_model("aa\nbb\ncc\ndd");
    model.force_tokenization(4).unwrap();
    let tail_before = model.line_tokens(4).unwrap();

    // Replacing text on line 1 leaves the outgoing state unchanged, so the
    // tail keeps its exact token arcs.
    model.apply_edit(0, 2, "xyz").unwrap();
    model.force_tokenization(4).unwrap();
    let tail_after = model.line_tokens(4).unwrap();
    assert!(Arc::ptr_eq(&tail_before, &tail_after));
    assert_eq!(model.line_tokens(1).unwrap().line_length(), 3);
}

#[test]
fn test_edit_changing_state_retokenizes_tail() {
    let (mut model, _registry, _lang, _reg) = toy_model("aa\nbb\ncc");
    model.force_tokenization(3).unwrap();
    assert_eq!(
        model.line_tokens(3).unwrap().token_type(0),
        StandardTokenType::Other
    );

    // Opening a comment on line 1 flips every following line.
    model.apply_edit(2, 2, "/*").unwrap();
    assert_eq!(
        model.line_tokens(2).unwrap().token_type(0),
        StandardTokenType::Comment
    );
    assert_eq!(
        model.line_tokens(3).unwrap().token_type(0),
        StandardTokenType::Comment
    );

    // And closing it flips them back.
    model.apply_edit(4, 4, "*/").unwrap();
    assert_eq!(
        model.line_tokens(3).unwrap().token_type(0),
        StandardTokenType::Other
    );
}

#[test]
fn test_tokens_cover_each_line() {
    let (mut model, _registry, _lang, _reg) = toy_model("one /* two */ three\n\nfour");
    for line in 1..=model.line_count() {
        let tokens = model.line_tokens(line).unwrap();
        let content = model.line_content(line).unwrap();
        assert_eq!(tokens.line_length(), content.len());
        assert_eq!(tokens.start_offset(0), 0);
        assert_eq!(tokens.end_offset(tokens.count() - 1), content.len());
        for i in 1..tokens.count() {
            assert_eq!(tokens.end_offset(i - 1), tokens.start_offset(i));
        }
    }
}

#[test]
fn test_set_language_retokenizes() {
    let (mut model, registry, _lang, _reg) = toy_model("/* x */");
    assert_eq!(
        model.line_tokens(1).unwrap().token_type(0),
        StandardTokenType::Comment
    );

    let plain = registry.register_language("plaintext");
    model.set_language(plain).unwrap();
    let tokens = model.line_tokens(1).unwrap();
    assert_eq!(tokens.count(), 1);
    assert_eq!(tokens.token_type(0), StandardTokenType::Other);
    assert_eq!(tokens.language(0), plain);

    assert!(model.set_language(LanguageId(99)).is_err());
}

#[test]
fn test_reset_after_registration_change() {
    let registry = LanguageRegistry::new();
    let lang = registry.register_language("toy");
    let reg = registry
        .register_tokenizer(lang, Arc::new(ToyTokenizer { lang }))
        .unwrap();

    let mut model = TextModel::new("/* x */", &registry, lang).unwrap();
    assert_eq!(
        model.line_tokens(1).unwrap().token_type(0),
        StandardTokenType::Comment
    );

    // Dropping the registration removes the tokenizer; stored tokens stay
    // until the model is told to re-tokenize.
    drop(reg);
    assert_eq!(
        model.line_tokens(1).unwrap().token_type(0),
        StandardTokenType::Comment
    );
    model.reset_tokenization();
    let tokens = model.line_tokens(1).unwrap();
    assert_eq!(tokens.count(), 1);
    assert_eq!(tokens.token_type(0), StandardTokenType::Other);
}

#[test]
fn test_brackets_respect_comment_tokens_end_to_end() {
    let registry = LanguageRegistry::new();
    let lang = registry.register_language("toy");
    let tok = registry
        .register_tokenizer(lang, Arc::new(ToyTokenizer { lang }))
        .unwrap();
    let brackets = registry
        .register_bracket_pairs(lang, &[("{", "}")])
        .unwrap();

    let mut model = TextModel::new("{ /* } \n } */\n}", &registry, lang).unwrap();
    let actual = model.match_bracket(Position::new(1, 1)).unwrap();
    assert_eq!(
        actual,
        Some((Range::new(1, 1, 1, 2), Range::new(3, 1, 3, 2)))
    );

    drop(tok);
    drop(brackets);
}
