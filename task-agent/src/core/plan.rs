//! Numbered-list isolation for plan responses.
//!
//! A block starts at the first `N. ` marker found anywhere in the text and
//! runs to the end of that line, then absorbs every following line that does
//! not itself begin with `N.`. Blocks are joined with newlines. When the text
//! has no marker at all the caller falls back to the raw response.

use std::sync::LazyLock;

use regex::Regex;

static ITEM_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\s+").expect("item start pattern should compile"));

static ITEM_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.").expect("item line pattern should compile"));

/// Return every numbered block in `text`, in order.
pub fn numbered_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(m) = ITEM_START_RE.find_at(text, pos) {
        let start = m.start();
        let mut end = line_end(text, m.end());

        // Continuation lines belong to the current item.
        while end < text.len() {
            let next_start = end + 1;
            if ITEM_LINE_RE.is_match(&text[next_start..]) {
                break;
            }
            end = line_end(text, next_start);
        }

        blocks.push(&text[start..end]);
        pos = end;
    }

    blocks
}

/// Isolate the numbered plan, or keep the whole response when there is none.
pub fn isolate_plan(response: &str) -> String {
    let blocks = numbered_blocks(response);
    if blocks.is_empty() {
        response.to_string()
    } else {
        blocks.join("\n")
    }
}

/// Byte offset of the next `\n` at or after `from`, or the end of `text`.
fn line_end(text: &str, from: usize) -> usize {
    text[from..]
        .find('\n')
        .map(|offset| from + offset)
        .unwrap_or(text.len())
}
