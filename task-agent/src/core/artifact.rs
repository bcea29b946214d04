//! Naming and typing of the generated artifact file.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of characters kept from the sanitized task.
pub const NAME_PREFIX_CHARS: usize = 20;

/// Tokens whose presence anywhere in the code selects a shell script.
pub const SHELL_TOKENS: [&str; 4] = ["echo", "mkdir", "cd", "bash"];

// `\w` in `regex` also matches combining marks; those count as non-word here.
static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\W\p{M}]").expect("non-word pattern should compile"));

/// Interpreter family for an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Python,
    Shell,
}

impl ArtifactKind {
    /// Classify code by a plain substring scan for [`SHELL_TOKENS`].
    pub fn detect(code: &str) -> Self {
        if SHELL_TOKENS.iter().any(|token| code.contains(token)) {
            Self::Shell
        } else {
            Self::Python
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Python => ".py",
            Self::Shell => ".sh",
        }
    }
}

/// Lower-case the task, replace each non-word character with `_` and keep the
/// first [`NAME_PREFIX_CHARS`] characters.
pub fn sanitized_prefix(task: &str) -> String {
    let lowered = task.to_lowercase();
    NON_WORD_RE
        .replace_all(&lowered, "_")
        .chars()
        .take(NAME_PREFIX_CHARS)
        .collect()
}

/// File name for the artifact holding `code` generated for `task`.
pub fn artifact_file_name(task: &str, kind: ArtifactKind) -> String {
    format!("{}{}", sanitized_prefix(task), kind.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_tokens_select_shell() {
        assert_eq!(ArtifactKind::detect("echo hi"), ArtifactKind::Shell);
        assert_eq!(ArtifactKind::detect("mkdir -p out"), ArtifactKind::Shell);
    }

    #[test]
    fn plain_python_selects_python() {
        assert_eq!(ArtifactKind::detect("print(\"hi\")"), ArtifactKind::Python);
        assert_eq!(ArtifactKind::detect(""), ArtifactKind::Python);
    }

    #[test]
    fn token_scan_matches_inside_words() {
        // `abcd` contains `cd`; the scan is deliberately crude.
        assert_eq!(ArtifactKind::detect("abcd = 1"), ArtifactKind::Shell);
    }

    #[test]
    fn punctuation_becomes_underscores() {
        assert_eq!(sanitized_prefix("List files!!"), "list_files__");
        assert_eq!(
            artifact_file_name("List files!!", ArtifactKind::Shell),
            "list_files__.sh"
        );
    }

    #[test]
    fn each_non_word_char_is_replaced_individually() {
        assert_eq!(sanitized_prefix("a  -b"), "a___b");
    }

    #[test]
    fn combining_marks_are_replaced() {
        // `İ` lowercases to `i` followed by U+0307 COMBINING DOT ABOVE.
        assert_eq!(sanitized_prefix("İstanbul trip"), "i_stanbul_trip");
        assert_eq!(sanitized_prefix("cafe\u{301} menu"), "cafe__menu");
        assert_eq!(sanitized_prefix("Grüße 2024"), "grüße_2024");
    }

    #[test]
    fn prefix_is_truncated_to_twenty_chars() {
        let name = artifact_file_name(
            "Create a backup of my home directory",
            ArtifactKind::Python,
        );
        assert_eq!(name, "create_a_backup_of_m.py");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let prefix = sanitized_prefix("ééééééééééééééééééééééé");
        assert_eq!(prefix.chars().count(), NAME_PREFIX_CHARS);
    }
}
