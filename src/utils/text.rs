//! Text helpers shared by classification and combo analysis

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}']+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercased word tokens; apostrophes stay inside words ("don't")
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_SEPARATOR
        .split(&text.to_lowercase())
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trimmed, single-spaced text
pub fn normalize_text(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Duolingo: Learn Spanish, Fast!"),
            vec!["duolingo", "learn", "spanish", "fast"]
        );
        assert_eq!(tokenize("Don't  wait - 'quoted'"), vec!["don't", "wait", "quoted"]);
        assert_eq!(tokenize("Café über 2024"), vec!["café", "über", "2024"]);
        assert!(tokenize("  -- ").is_empty());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  how \t to\n draw "), "how to draw");
    }
}
