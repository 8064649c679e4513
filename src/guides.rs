//! Indent guide computation.
//!
//! Indent is measured in columns with tab expansion; a line's guide level is
//! the indent rounded up to whole indentation steps. Whitespace-only lines
//! have no indent of their own and inherit the larger of the levels of the
//! nearest content lines above and below, so guides run through blank lines
//! inside a block.

use crate::buffer::LineBuffer;

/// The indent block containing a line, as resolved by
/// [`active_indent_guide`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveIndentGuide {
    pub start_line_number: usize,
    pub end_line_number: usize,
    pub indent: usize,
}

/// Leading-whitespace width of a line, with tabs advancing to the next
/// multiple of `tab_size`. `None` for a line with no content.
#[must_use]
pub fn compute_indent_width(line: &str, tab_size: usize) -> Option<usize> {
    let tab = tab_size.max(1);
    let mut indent = 0;
    for c in line.chars() {
        match c {
            ' ' => indent += 1,
            '\t' => indent = indent - indent % tab + tab,
            _ => return Some(indent),
        }
    }
    None
}

fn ceil_div(a: usize, b: usize) -> usize {
    a.div_ceil(b)
}

/// Indent width of the nearest content line above `line_number`.
fn content_indent_above(buffer: &LineBuffer, tab: usize, line_number: usize) -> Option<usize> {
    (1..line_number)
        .rev()
        .find_map(|ln| compute_indent_width(&buffer.line_content(ln - 1), tab))
}

/// Nearest content line at or below `line_number`, with its indent width.
fn content_indent_below(
    buffer: &LineBuffer,
    tab: usize,
    line_number: usize,
) -> Option<(usize, usize)> {
    let line_count = buffer.line_count();
    (line_number..=line_count).find_map(|ln| {
        compute_indent_width(&buffer.line_content(ln - 1), tab).map(|indent| (ln, indent))
    })
}

fn whitespace_line_level(above: Option<usize>, below: Option<usize>, tab: usize) -> usize {
    match (above, below) {
        (Some(a), Some(b)) => ceil_div(a, tab).max(ceil_div(b, tab)),
        _ => 0,
    }
}

/// Guide level of one line, resolving whitespace-only lines through their
/// neighbors.
fn line_level(buffer: &LineBuffer, tab: usize, line_number: usize) -> usize {
    match compute_indent_width(&buffer.line_content(line_number - 1), tab) {
        Some(indent) => ceil_div(indent, tab),
        None => whitespace_line_level(
            content_indent_above(buffer, tab, line_number),
            content_indent_below(buffer, tab, line_number + 1).map(|(_, i)| i),
            tab,
        ),
    }
}

/// Guide levels for the 1-based inclusive line range `start..=end`.
///
/// Lines outside the range are consulted only to resolve whitespace-only
/// lines at the range edges.
#[must_use]
pub fn lines_indent_guides(
    buffer: &LineBuffer,
    tab_size: usize,
    start_line: usize,
    end_line: usize,
) -> Vec<usize> {
    let tab = tab_size.max(1);
    let mut result = Vec::with_capacity(end_line.saturating_sub(start_line) + 1);

    // Nearest content indents are memoized across the walk; the below lookup
    // rescans only when the cached line falls behind the cursor.
    let mut above: Option<usize> = None;
    let mut above_ready = false;
    let mut below: Option<(usize, usize)> = None;
    let mut below_ready = false;

    for line_number in start_line..=end_line {
        match compute_indent_width(&buffer.line_content(line_number - 1), tab) {
            Some(indent) => {
                above = Some(indent);
                above_ready = true;
                result.push(ceil_div(indent, tab));
            }
            None => {
                if !above_ready {
                    above = content_indent_above(buffer, tab, line_number);
                    above_ready = true;
                }
                let stale = if below_ready {
                    below.is_some_and(|(ln, _)| ln < line_number)
                } else {
                    true
                };
                if stale {
                    below = content_indent_below(buffer, tab, line_number + 1);
                    below_ready = true;
                }
                result.push(whitespace_line_level(above, below.map(|(_, i)| i), tab));
            }
        }
    }
    result
}

/// Resolve the indent block a line belongs to, expanding outward until the
/// indent drops below the block's level.
///
/// `min_line` and `max_line` bound how far the expansion may look beyond the
/// immediate neighborhood; the immediate neighbors of `line_number` are
/// always consulted so the block is anchored correctly even at the edge of
/// the viewport.
#[must_use]
pub fn active_indent_guide(
    buffer: &LineBuffer,
    tab_size: usize,
    line_number: usize,
    min_line: usize,
    max_line: usize,
) -> ActiveIndentGuide {
    let tab = tab_size.max(1);
    let line_count = buffer.line_count();

    let mut go_up = true;
    let mut go_down = true;
    let mut start = line_number;
    let mut end = line_number;
    let mut indent = 0usize;
    let mut initial = 0usize;

    let mut distance = 0usize;
    while go_up || go_down {
        let up_ln = line_number.checked_sub(distance);
        let down_ln = line_number + distance;

        if distance > 1 && up_ln.is_none_or(|ln| ln < 1 || ln < min_line) {
            go_up = false;
        }
        if distance > 1 && (down_ln > line_count || down_ln > max_line) {
            go_down = false;
        }
        if distance > 50_000 {
            go_up = false;
            go_down = false;
        }

        let up_level = match up_ln {
            Some(ln) if go_up && ln >= 1 => Some(line_level(buffer, tab, ln)),
            _ => None,
        };
        let down_level = if go_down && down_ln <= line_count {
            Some(line_level(buffer, tab, down_ln))
        } else {
            None
        };

        if distance == 0 {
            initial = up_level.unwrap_or(0);
            distance += 1;
            continue;
        }

        if distance == 1 {
            // The line just below opening a deeper block means the queried
            // line starts that block; the guide is the block's.
            if let Some(dl) = down_level {
                if dl == initial + 1 {
                    go_up = false;
                    start = down_ln;
                    end = down_ln;
                    indent = dl;
                    distance += 1;
                    continue;
                }
            }
            // Symmetrically for a block ending just above.
            if let (Some(ln), Some(ul)) = (up_ln, up_level) {
                if ul == initial + 1 {
                    go_down = false;
                    start = ln;
                    end = ln;
                    indent = ul;
                    distance += 1;
                    continue;
                }
            }
            start = line_number;
            end = line_number;
            indent = initial;
            if indent == 0 {
                return ActiveIndentGuide {
                    start_line_number: start,
                    end_line_number: end,
                    indent,
                };
            }
        }

        if go_up {
            match (up_ln, up_level) {
                (Some(ln), Some(level)) if level >= indent => start = ln,
                _ => go_up = false,
            }
        }
        if go_down {
            match down_level {
                Some(level) if level >= indent => end = down_ln,
                _ => go_down = false,
            }
        }

        distance += 1;
    }

    ActiveIndentGuide {
        start_line_number: start,
        end_line_number: end,
        indent,
    }
}
