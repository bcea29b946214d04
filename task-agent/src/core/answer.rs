//! Yes/no answer parsing.

/// `yes` or `y`, case-insensitive, ignoring surrounding whitespace.
/// Anything else counts as no.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_yes_forms() {
        for answer in ["yes", "y", "YES", "Y", "Yes", " y \n"] {
            assert!(is_affirmative(answer), "{answer:?}");
        }
    }

    #[test]
    fn everything_else_is_no() {
        for answer in ["no", "n", "", "yeah", "ok", "yes please"] {
            assert!(!is_affirmative(answer), "{answer:?}");
        }
    }
}
