//! Compiled bracket definitions for one language.
//!
//! Bracket pairs are declared as `(open, close)` text pairs and compiled
//! into a form suited for scanning: pairs sharing an open or close text are
//! merged into one *family* (matching any open of the family against any of
//! its closes), all texts are lowercased for case-insensitive comparison,
//! and each family's scan list carries *blocker* texts: longer bracket texts
//! of the same language that contain one of the family's texts, so that
//! `end` does not fire inside `end if`.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// One merged group of interchangeable open/close texts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BracketFamily {
    /// Open texts, lowercased, in declaration order.
    pub opens: Vec<String>,
    /// Close texts, lowercased, in declaration order.
    pub closes: Vec<String>,
}

/// A scannable bracket text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BracketToken {
    /// Lowercased text.
    pub text: String,
    /// Index into [`CompiledBrackets::families`].
    pub family: usize,
    pub is_open: bool,
    /// A blocker is matched (consuming its text) but never counted.
    pub is_blocker: bool,
}

/// All bracket definitions of one language, ready for scanning.
#[derive(Clone, Debug)]
pub struct CompiledBrackets {
    families: Vec<BracketFamily>,
    /// Every declared text, longest first.
    union: Vec<BracketToken>,
    /// Per family: its own texts plus blockers, longest first.
    per_family: Vec<Vec<BracketToken>>,
    /// Longest text, in bytes.
    max_len: usize,
}

impl CompiledBrackets {
    /// Compile declared `(open, close)` pairs.
    ///
    /// # Errors
    /// Fails on a pair with an empty side or on a duplicate pair
    /// (case-insensitive).
    pub fn compile(pairs: &[(&str, &str)]) -> Result<Self> {
        let mut seen: Vec<(String, String)> = Vec::new();
        let mut families: Vec<BracketFamily> = Vec::new();
        let mut family_of: HashMap<String, usize> = HashMap::new();

        for &(open, close) in pairs {
            if open.is_empty() || close.is_empty() {
                return Err(Error::InvalidBracketPair {
                    open: open.to_string(),
                    close: close.to_string(),
                });
            }
            let open = open.to_ascii_lowercase();
            let close = close.to_ascii_lowercase();
            if seen.iter().any(|(o, c)| *o == open && *c == close) {
                return Err(Error::DuplicateBracketPair { open, close });
            }
            seen.push((open.clone(), close.clone()));

            let target = match (family_of.get(&open), family_of.get(&close)) {
                (Some(&a), Some(&b)) if a != b => {
                    let keep = merge_families(&mut families, a, b);
                    let drain = if keep == a { b } else { a };
                    for idx in family_of.values_mut() {
                        if *idx == drain {
                            *idx = keep;
                        }
                    }
                    Some(keep)
                }
                (Some(&a), _) => Some(a),
                (_, Some(&b)) => Some(b),
                (None, None) => None,
            };
            let idx = match target {
                Some(idx) => idx,
                None => {
                    families.push(BracketFamily {
                        opens: Vec::new(),
                        closes: Vec::new(),
                    });
                    families.len() - 1
                }
            };
            push_unique(&mut families[idx].opens, &open);
            push_unique(&mut families[idx].closes, &close);
            family_of.insert(open, idx);
            family_of.insert(close, idx);
        }

        // Merging may leave empty slots behind; compact them away.
        let families: Vec<BracketFamily> = families
            .into_iter()
            .filter(|f| !f.opens.is_empty() || !f.closes.is_empty())
            .collect();

        let mut union: Vec<BracketToken> = Vec::new();
        for (idx, family) in families.iter().enumerate() {
            for text in &family.opens {
                // A text on both sides scans as a close.
                if family.closes.contains(text) {
                    continue;
                }
                union.push(BracketToken {
                    text: text.clone(),
                    family: idx,
                    is_open: true,
                    is_blocker: false,
                });
            }
            for text in &family.closes {
                union.push(BracketToken {
                    text: text.clone(),
                    family: idx,
                    is_open: false,
                    is_blocker: false,
                });
            }
        }
        union.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
        let max_len = union.iter().map(|t| t.text.len()).max().unwrap_or(0);

        let per_family = (0..families.len())
            .map(|idx| {
                let mut toks: Vec<BracketToken> = union
                    .iter()
                    .filter(|t| t.family == idx)
                    .cloned()
                    .collect();
                let member_texts: Vec<String> = toks.iter().map(|t| t.text.clone()).collect();
                for other in &union {
                    if other.family == idx {
                        continue;
                    }
                    let is_superstring = member_texts
                        .iter()
                        .any(|m| other.text.len() > m.len() && other.text.contains(m.as_str()));
                    if is_superstring {
                        toks.push(BracketToken {
                            is_blocker: true,
                            ..other.clone()
                        });
                    }
                }
                toks.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
                toks
            })
            .collect();

        Ok(Self {
            families,
            union,
            per_family,
            max_len,
        })
    }

    #[must_use]
    pub fn families(&self) -> &[BracketFamily] {
        &self.families
    }

    #[must_use]
    pub fn family(&self, idx: usize) -> &BracketFamily {
        &self.families[idx]
    }

    /// Every bracket text of the language, longest first.
    #[must_use]
    pub fn union_tokens(&self) -> &[BracketToken] {
        &self.union
    }

    /// One family's texts plus blockers, longest first.
    #[must_use]
    pub fn family_tokens(&self, idx: usize) -> &[BracketToken] {
        &self.per_family[idx]
    }

    /// Longest bracket text, in bytes. Bounds single-line search windows.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

fn push_unique(list: &mut Vec<String>, text: &str) {
    if !list.iter().any(|t| t == text) {
        list.push(text.to_string());
    }
}

fn merge_families(families: &mut [BracketFamily], a: usize, b: usize) -> usize {
    let (keep, drain) = if a < b { (a, b) } else { (b, a) };
    let drained = std::mem::replace(
        &mut families[drain],
        BracketFamily {
            opens: Vec::new(),
            closes: Vec::new(),
        },
    );
    for text in &drained.opens {
        push_unique(&mut families[keep].opens, text);
    }
    for text in &drained.closes {
        push_unique(&mut families[keep].closes, text);
    }
    keep
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn matches_at(line: &str, start: usize, token: &BracketToken) -> bool {
    let bytes = line.as_bytes();
    let end = start + token.text.len();
    if end > bytes.len() || !line.is_char_boundary(start) || !line.is_char_boundary(end) {
        return false;
    }
    if !bytes[start..end].eq_ignore_ascii_case(token.text.as_bytes()) {
        return false;
    }
    // Word-ish bracket texts must sit on word boundaries, checked against the
    // full line even when the search window is clipped.
    if token.text.chars().next().is_some_and(is_word_char)
        && line[..start].chars().next_back().is_some_and(is_word_char)
    {
        return false;
    }
    if token.text.chars().next_back().is_some_and(is_word_char)
        && line[end..].chars().next().is_some_and(is_word_char)
    {
        return false;
    }
    true
}

/// Earliest match in `line[from..to)`, longest token winning at each offset.
#[must_use]
pub fn find_next_in_range<'a>(
    line: &str,
    from: usize,
    to: usize,
    tokens: &'a [BracketToken],
) -> Option<(usize, &'a BracketToken)> {
    let to = to.min(line.len());
    for start in from..to {
        if !line.is_char_boundary(start) {
            continue;
        }
        for token in tokens {
            if start + token.text.len() <= to && matches_at(line, start, token) {
                return Some((start, token));
            }
        }
    }
    None
}

/// Match in `line[from..to)` with the greatest end offset, longest token
/// winning among matches sharing that end.
#[must_use]
pub fn find_prev_in_range<'a>(
    line: &str,
    from: usize,
    to: usize,
    tokens: &'a [BracketToken],
) -> Option<(usize, &'a BracketToken)> {
    let to = to.min(line.len());
    for end in (from..=to).rev() {
        if !line.is_char_boundary(end) {
            continue;
        }
        for token in tokens {
            let Some(start) = end.checked_sub(token.text.len()) else {
                continue;
            };
            if start >= from && matches_at(line, start, token) {
                return Some((start, token));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pairs: &[(&str, &str)]) -> CompiledBrackets {
        CompiledBrackets::compile(pairs).unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            CompiledBrackets::compile(&[("", ")")]),
            Err(Error::InvalidBracketPair { .. })
        ));
        assert!(matches!(
            CompiledBrackets::compile(&[("(", ")"), ("(", ")")]),
            Err(Error::DuplicateBracketPair { .. })
        ));
        // Case-insensitive duplicate detection.
        assert!(CompiledBrackets::compile(&[("Begin", "End"), ("BEGIN", "END")]).is_err());
    }

    #[test]
    fn test_simple_families() {
        let compiled = compile(&[("{", "}"), ("[", "]"), ("(", ")")]);
        assert_eq!(compiled.families().len(), 3);
        assert_eq!(compiled.max_len(), 1);
        assert_eq!(compiled.union_tokens().len(), 6);
        let open_curly = compiled
            .union_tokens()
            .iter()
            .find(|t| t.text == "{")
            .unwrap();
        assert!(open_curly.is_open);
        assert_eq!(compiled.family(open_curly.family).closes, vec!["}"]);
    }

    #[test]
    fn test_shared_close_merges_families() {
        let compiled = compile(&[
            ("recordbegin", "endrecord"),
            ("simplerecordbegin", "endrecord"),
        ]);
        assert_eq!(compiled.families().len(), 1);
        let family = compiled.family(0);
        assert_eq!(family.opens, vec!["recordbegin", "simplerecordbegin"]);
        assert_eq!(family.closes, vec!["endrecord"]);
    }

    #[test]
    fn test_blockers_cover_superstrings() {
        let compiled = compile(&[("begin", "end"), ("end if", ";"), ("end loop", ";")]);
        let begin_family = compiled
            .union_tokens()
            .iter()
            .find(|t| t.text == "begin")
            .unwrap()
            .family;
        let toks = compiled.family_tokens(begin_family);
        let blockers: Vec<&str> = toks
            .iter()
            .filter(|t| t.is_blocker)
            .map(|t| t.text.as_str())
            .collect();
        assert!(blockers.contains(&"end if"));
        assert!(blockers.contains(&"end loop"));
        // Longest first, so blockers are tried before the shorter "end".
        let end_pos = toks.iter().position(|t| t.text == "end").unwrap();
        let blocker_pos = toks.iter().position(|t| t.text == "end if").unwrap();
        assert!(blocker_pos < end_pos);
    }

    #[test]
    fn test_find_next_longest_wins() {
        let compiled = compile(&[("begin", "end"), ("end if", ";"), ("end loop", ";")]);
        let begin_family = compiled
            .union_tokens()
            .iter()
            .find(|t| t.text == "begin")
            .unwrap()
            .family;
        let toks = compiled.family_tokens(begin_family);

        let line = "end if; end";
        let (start, tok) = find_next_in_range(line, 0, line.len(), toks).unwrap();
        assert_eq!((start, tok.text.as_str()), (0, "end if"));
        assert!(tok.is_blocker);
        let (start, tok) = find_next_in_range(line, 7, line.len(), toks).unwrap();
        assert_eq!((start, tok.text.as_str()), (8, "end"));
        assert!(!tok.is_blocker);
    }

    #[test]
    fn test_word_boundaries() {
        let compiled = compile(&[("begin", "end")]);
        let toks = compiled.family_tokens(0);
        assert!(find_next_in_range("bending", 0, 7, toks).is_none());
        assert!(find_next_in_range("the_end", 0, 7, toks).is_none());
        let (start, _) = find_next_in_range("the end;", 0, 8, toks).unwrap();
        assert_eq!(start, 4);
        // Boundary chars outside a clipped window still count.
        assert!(find_next_in_range("bend", 1, 4, toks).is_none());
    }

    #[test]
    fn test_case_insensitive_match() {
        let compiled = compile(&[("module", "end module")]);
        let toks = compiled.family_tokens(0);
        let line = "End Module";
        let (start, tok) = find_next_in_range(line, 0, line.len(), toks).unwrap();
        assert_eq!(start, 0);
        assert_eq!(tok.text, "end module");
        assert!(!tok.is_open);
    }

    #[test]
    fn test_find_prev_prefers_greatest_end() {
        let compiled = compile(&[("{", "}"), ("(", ")")]);
        let line = "({)}";
        let (start, tok) = find_prev_in_range(line, 0, line.len(), compiled.union_tokens()).unwrap();
        assert_eq!((start, tok.text.as_str()), (3, "}"));
        let (start, tok) = find_prev_in_range(line, 0, 2, compiled.union_tokens()).unwrap();
        assert_eq!((start, tok.text.as_str()), (1, "{"));
    }
}
