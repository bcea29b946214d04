//! Best-effort extraction of runnable code from free-form model output.
//!
//! Fenced blocks win. Without a fence, lines are kept when they look like code
//! and are not obviously commentary. The result may be empty; callers decide
//! what an empty fragment means.

use std::sync::LazyLock;

use regex::Regex;

static FENCED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:python|bash|sh)?\s*([\s\S]*?)```").expect("fence pattern should compile")
});

static CODE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w\d_]+\s*[=\(\[\{]|print|echo|import|def|class|function|mkdir|touch|cd")
        .expect("code line pattern should compile")
});

/// Leading markers that identify commentary or quoted prose.
const COMMENT_PREFIXES: [&str; 5] = ["#", "//", "/*", "*", ">"];

/// Extract the best-guess code fragment from `text`.
///
/// Returns an empty string when neither a fenced block nor any code-like line
/// is found.
pub fn extract_code(text: &str) -> String {
    if let Some(fenced) = first_fenced_block(text) {
        return fenced;
    }
    code_like_lines(text)
}

/// Inner content of the first fenced block, trimmed.
fn first_fenced_block(text: &str) -> Option<String> {
    FENCED_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn code_like_lines(text: &str) -> String {
    text.split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !COMMENT_PREFIXES.iter().any(|p| trimmed.starts_with(p))
        })
        .filter(|line| CODE_LINE_RE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}
