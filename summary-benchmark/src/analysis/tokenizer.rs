//! Text normalization for overlap metrics

use regex::Regex;
use std::sync::OnceLock;

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+").expect("word pattern is a valid regex"))
}

/// Split text into lowercase word tokens.
///
/// Tokens are maximal runs of Unicode word characters; punctuation and
/// whitespace never appear in the output. Order is preserved, and empty or
/// whitespace-only input yields an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(
            tokenize("The Cat, sat... on the MAT!"),
            vec!["the", "cat", "sat", "on", "the", "mat"]
        );
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
        assert!(tokenize("?!, ...").is_empty());
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(
            tokenize("Vláda schválila ROZPOČET."),
            vec!["vláda", "schválila", "rozpočet"]
        );
    }

    #[test]
    fn test_numbers_are_tokens() {
        assert_eq!(tokenize("Q3 revenue: 4.5%"), vec!["q3", "revenue", "4", "5"]);
    }
}
