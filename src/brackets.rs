//! Cross-line, token-aware bracket search.
//!
//! All scanning here respects token classification: brackets inside comment,
//! string and regex tokens are invisible, and a bracket only pairs with
//! brackets carried by tokens of the same language. Lines are tokenized
//! lazily as the scan reaches them.

use std::sync::Arc;

use crate::language::brackets::{
    find_next_in_range, find_prev_in_range, BracketToken, CompiledBrackets,
};
use crate::language::LanguageId;
use crate::position::{Position, Range};
use crate::tokens::token::LineTokens;
use crate::tokens::TokenizationDriver;

/// A bracket located by a document sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundBracket {
    pub range: Range,
    pub is_open: bool,
    /// Canonical (first declared) open text of the bracket's family.
    pub open_text: String,
    /// Canonical close text of the bracket's family.
    pub close_text: String,
}

fn range_on_line(line_idx: usize, start: usize, end: usize) -> Range {
    Range::new(line_idx + 1, start + 1, line_idx + 1, end + 1)
}

fn searchable(tokens: &LineTokens, idx: usize, lang: LanguageId) -> bool {
    tokens.language(idx) == lang && !tokens.token_type(idx).ignores_brackets()
}

/// Find the bracket pair touching `position`, returning
/// `[bracket under the position, its counterpart]`.
///
/// A position touches a bracket when it lies anywhere on it, including the
/// boundary just after it. When several brackets touch the position, the
/// rightmost one with a counterpart wins. An unmatched bracket yields `None`.
pub fn match_bracket(
    driver: &mut TokenizationDriver<'_>,
    position: Position,
) -> Option<(Range, Range)> {
    let line_idx = position.line_number - 1;
    let line = driver.buffer().line_content(line_idx);
    let tokens = driver.line_tokens(line_idx);
    let offset = position.column - 1;
    let t = tokens.index_at_offset(offset);
    let lang = tokens.language(t);

    // Probe the token under the position.
    if let Some(brackets) = driver.registry().brackets_for(lang) {
        if !tokens.token_type(t).ignores_brackets() {
            let search_start = clamp_search_start(
                &tokens,
                t,
                lang,
                offset.saturating_sub(brackets.max_len()),
            );
            let search_end = (offset + brackets.max_len()).min(line.len());

            let mut best = None;
            let mut from = search_start;
            while let Some((s, tok)) =
                find_next_in_range(&line, from, search_end, brackets.union_tokens())
            {
                if s > offset {
                    break;
                }
                let e = s + tok.text.len();
                if offset <= e {
                    if let Some(other) = resolve(driver, &brackets, tok, lang, line_idx, s, e) {
                        // Rightmost touching bracket wins.
                        best = Some((range_on_line(line_idx, s, e), other));
                    }
                }
                from = e;
            }
            if best.is_some() {
                return best;
            }
        }
    }

    // At a token boundary the position also touches the previous token; a
    // bracket ending exactly here (e.g. `{` closing a template expression
    // before a string token) still counts.
    if t > 0 && tokens.start_offset(t) == offset {
        let pt = t - 1;
        let plang = tokens.language(pt);
        if let Some(brackets) = driver.registry().brackets_for(plang) {
            if !tokens.token_type(pt).ignores_brackets() {
                let search_start = clamp_search_start(
                    &tokens,
                    pt,
                    plang,
                    offset.saturating_sub(brackets.max_len()),
                );
                let search_end = tokens.end_offset(pt);
                if let Some((s, tok)) =
                    find_prev_in_range(&line, search_start, search_end, brackets.union_tokens())
                {
                    let e = s + tok.text.len();
                    if e == offset {
                        let other = resolve(driver, &brackets, tok, plang, line_idx, s, e)?;
                        return Some((range_on_line(line_idx, s, e), other));
                    }
                }
            }
        }
    }

    None
}

/// Pull the left edge of a single-line search window in to the nearest
/// non-searchable token boundary.
fn clamp_search_start(
    tokens: &LineTokens,
    token_idx: usize,
    lang: LanguageId,
    mut search_start: usize,
) -> usize {
    let mut i = token_idx;
    while i > 0 {
        let prev = i - 1;
        if tokens.end_offset(prev) <= search_start {
            break;
        }
        if !searchable(tokens, prev, lang) {
            search_start = tokens.end_offset(prev);
            break;
        }
        i = prev;
    }
    search_start
}

/// Counterpart of a bracket found at `[start, end)` on `line_idx`.
fn resolve(
    driver: &mut TokenizationDriver<'_>,
    brackets: &CompiledBrackets,
    tok: &BracketToken,
    lang: LanguageId,
    line_idx: usize,
    start: usize,
    end: usize,
) -> Option<Range> {
    if tok.is_open {
        find_matching_down(driver, brackets, tok.family, lang, line_idx, end)
    } else {
        find_matching_up(driver, brackets, tok.family, lang, line_idx, start)
    }
}

/// Scan forward for the close balancing an open seen just before
/// `start_offset`.
fn find_matching_down(
    driver: &mut TokenizationDriver<'_>,
    brackets: &CompiledBrackets,
    family: usize,
    lang: LanguageId,
    start_line_idx: usize,
    start_offset: usize,
) -> Option<Range> {
    let toks = brackets.family_tokens(family);
    let line_count = driver.line_count();
    let mut count: i64 = 1;

    for line_idx in start_line_idx..line_count {
        let tokens = driver.line_tokens(line_idx);
        let line = driver.buffer().line_content(line_idx);

        let mut token_idx = 0;
        let mut search_start = 0;
        let mut search_end = 0;
        if line_idx == start_line_idx {
            token_idx = tokens.index_at_offset(start_offset);
            search_start = start_offset;
            search_end = start_offset;
        }

        let mut prev_searchable = true;
        while token_idx < tokens.count() {
            if searchable(&tokens, token_idx, lang) {
                if prev_searchable {
                    search_end = tokens.end_offset(token_idx);
                } else {
                    search_start = tokens.start_offset(token_idx);
                    search_end = tokens.end_offset(token_idx);
                }
                prev_searchable = true;
            } else {
                if prev_searchable && search_start < search_end {
                    if let Some(range) =
                        scan_down(&line, line_idx, search_start, search_end, toks, &mut count)
                    {
                        return Some(range);
                    }
                }
                prev_searchable = false;
            }
            token_idx += 1;
        }
        if prev_searchable && search_start < search_end {
            if let Some(range) =
                scan_down(&line, line_idx, search_start, search_end, toks, &mut count)
            {
                return Some(range);
            }
        }
    }
    None
}

fn scan_down(
    line: &str,
    line_idx: usize,
    from: usize,
    to: usize,
    toks: &[BracketToken],
    count: &mut i64,
) -> Option<Range> {
    let mut from = from;
    while let Some((s, tok)) = find_next_in_range(line, from, to, toks) {
        let e = s + tok.text.len();
        if !tok.is_blocker {
            if tok.is_open {
                *count += 1;
            } else {
                *count -= 1;
                if *count == 0 {
                    return Some(range_on_line(line_idx, s, e));
                }
            }
        }
        from = e;
    }
    None
}

/// Scan backward for the open balancing a close seen just after
/// `start_offset`.
fn find_matching_up(
    driver: &mut TokenizationDriver<'_>,
    brackets: &CompiledBrackets,
    family: usize,
    lang: LanguageId,
    start_line_idx: usize,
    start_offset: usize,
) -> Option<Range> {
    let toks = brackets.family_tokens(family);
    let mut count: i64 = 1;

    for line_idx in (0..=start_line_idx).rev() {
        let tokens = driver.line_tokens(line_idx);
        let line = driver.buffer().line_content(line_idx);

        let mut token_idx = tokens.count() as isize - 1;
        let mut search_start = line.len();
        let mut search_end = line.len();
        if line_idx == start_line_idx {
            token_idx = tokens.index_at_offset(start_offset) as isize;
            search_start = start_offset;
            search_end = start_offset;
        }

        let mut prev_searchable = true;
        while token_idx >= 0 {
            let idx = token_idx as usize;
            if searchable(&tokens, idx, lang) {
                if prev_searchable {
                    search_start = tokens.start_offset(idx);
                } else {
                    search_start = tokens.start_offset(idx);
                    search_end = tokens.end_offset(idx);
                }
                prev_searchable = true;
            } else {
                if prev_searchable && search_start < search_end {
                    if let Some(range) =
                        scan_up(&line, line_idx, search_start, search_end, toks, &mut count)
                    {
                        return Some(range);
                    }
                }
                prev_searchable = false;
            }
            token_idx -= 1;
        }
        if prev_searchable && search_start < search_end {
            if let Some(range) =
                scan_up(&line, line_idx, search_start, search_end, toks, &mut count)
            {
                return Some(range);
            }
        }
    }
    None
}

fn scan_up(
    line: &str,
    line_idx: usize,
    from: usize,
    to: usize,
    toks: &[BracketToken],
    count: &mut i64,
) -> Option<Range> {
    let mut to = to;
    while to > from {
        let Some((s, tok)) = find_prev_in_range(line, from, to, toks) else {
            break;
        };
        let e = s + tok.text.len();
        if !tok.is_blocker {
            if tok.is_open {
                *count -= 1;
                if *count == 0 {
                    return Some(range_on_line(line_idx, s, e));
                }
            } else {
                *count += 1;
            }
        }
        to = s;
    }
    None
}

fn to_found(brackets: &CompiledBrackets, tok: &BracketToken, range: Range) -> FoundBracket {
    let family = brackets.family(tok.family);
    FoundBracket {
        range,
        is_open: tok.is_open,
        open_text: family.opens.first().cloned().unwrap_or_default(),
        close_text: family.closes.first().cloned().unwrap_or_default(),
    }
}

/// First bracket starting at or after `position`, in any language.
pub fn find_next_bracket(
    driver: &mut TokenizationDriver<'_>,
    position: Position,
) -> Option<FoundBracket> {
    let line_count = driver.line_count();
    let start_line_idx = position.line_number - 1;
    let mut lang: Option<LanguageId> = None;
    let mut brackets: Option<Arc<CompiledBrackets>> = None;

    for line_idx in start_line_idx..line_count {
        let tokens = driver.line_tokens(line_idx);
        let line = driver.buffer().line_content(line_idx);

        let mut token_idx = 0;
        let mut search_start = 0;
        let mut search_end = 0;
        if line_idx == start_line_idx {
            let offset = position.column - 1;
            token_idx = tokens.index_at_offset(offset);
            search_start = offset;
            search_end = offset;
        }

        let mut prev_searchable = true;
        while token_idx < tokens.count() {
            let token_lang = tokens.language(token_idx);
            if lang != Some(token_lang) {
                // Language switch: finish the accumulated range first.
                if let Some(b) = &brackets {
                    if prev_searchable && search_start < search_end {
                        if let Some(found) = sweep_next(&line, line_idx, search_start, search_end, b)
                        {
                            return Some(found);
                        }
                        prev_searchable = false;
                    }
                }
                lang = Some(token_lang);
                brackets = driver.registry().brackets_for(token_lang);
            }
            let search_in = brackets.is_some() && !tokens.token_type(token_idx).ignores_brackets();
            if search_in {
                if prev_searchable {
                    search_end = tokens.end_offset(token_idx);
                } else {
                    search_start = tokens.start_offset(token_idx);
                    search_end = tokens.end_offset(token_idx);
                }
            } else if let Some(b) = &brackets {
                if prev_searchable && search_start < search_end {
                    if let Some(found) = sweep_next(&line, line_idx, search_start, search_end, b) {
                        return Some(found);
                    }
                }
            }
            prev_searchable = search_in;
            token_idx += 1;
        }
        if let Some(b) = &brackets {
            if prev_searchable && search_start < search_end {
                if let Some(found) = sweep_next(&line, line_idx, search_start, search_end, b) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn sweep_next(
    line: &str,
    line_idx: usize,
    from: usize,
    to: usize,
    brackets: &CompiledBrackets,
) -> Option<FoundBracket> {
    let (s, tok) = find_next_in_range(line, from, to, brackets.union_tokens())?;
    Some(to_found(
        brackets,
        tok,
        range_on_line(line_idx, s, s + tok.text.len()),
    ))
}

/// Last bracket ending at or before `position`, in any language.
pub fn find_prev_bracket(
    driver: &mut TokenizationDriver<'_>,
    position: Position,
) -> Option<FoundBracket> {
    let start_line_idx = position.line_number - 1;
    let mut lang: Option<LanguageId> = None;
    let mut brackets: Option<Arc<CompiledBrackets>> = None;

    for line_idx in (0..=start_line_idx).rev() {
        let tokens = driver.line_tokens(line_idx);
        let line = driver.buffer().line_content(line_idx);

        let mut token_idx = tokens.count() as isize - 1;
        let mut search_start = line.len();
        let mut search_end = line.len();
        if line_idx == start_line_idx {
            let offset = position.column - 1;
            token_idx = tokens.index_at_offset(offset) as isize;
            search_start = offset;
            search_end = offset;
        }

        let mut prev_searchable = true;
        while token_idx >= 0 {
            let idx = token_idx as usize;
            let token_lang = tokens.language(idx);
            if lang != Some(token_lang) {
                if let Some(b) = &brackets {
                    if prev_searchable && search_start < search_end {
                        if let Some(found) = sweep_prev(&line, line_idx, search_start, search_end, b)
                        {
                            return Some(found);
                        }
                        prev_searchable = false;
                    }
                }
                lang = Some(token_lang);
                brackets = driver.registry().brackets_for(token_lang);
            }
            let search_in = brackets.is_some() && !tokens.token_type(idx).ignores_brackets();
            if search_in {
                if prev_searchable {
                    search_start = tokens.start_offset(idx);
                } else {
                    search_start = tokens.start_offset(idx);
                    search_end = tokens.end_offset(idx);
                }
            } else if let Some(b) = &brackets {
                if prev_searchable && search_start < search_end {
                    if let Some(found) = sweep_prev(&line, line_idx, search_start, search_end, b) {
                        return Some(found);
                    }
                }
            }
            prev_searchable = search_in;
            token_idx -= 1;
        }
        if let Some(b) = &brackets {
            if prev_searchable && search_start < search_end {
                if let Some(found) = sweep_prev(&line, line_idx, search_start, search_end, b) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn sweep_prev(
    line: &str,
    line_idx: usize,
    from: usize,
    to: usize,
    brackets: &CompiledBrackets,
) -> Option<FoundBracket> {
    let (s, tok) = find_prev_in_range(line, from, to, brackets.union_tokens())?;
    Some(to_found(
        brackets,
        tok,
        range_on_line(line_idx, s, s + tok.text.len()),
    ))
}
