//! Compiled pattern model
//! Matchers are built once at load time; matching never recompiles or fails.

use std::sync::Arc;
use regex::Regex;

use crate::rule::{IntentPatternConfig, IntentType};

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Substring match; the needle is pre-lowercased when case-insensitive
    Contains { needle: String, case_sensitive: bool },
    /// Literal bounded by word boundaries
    WordBoundary(Regex),
    /// User-supplied regular expression
    Regex(Regex),
}

impl Matcher {
    /// Match against already-trimmed input
    pub fn is_match(&self, input: &str) -> bool {
        match self {
            Matcher::Contains { needle, case_sensitive: true } => input.contains(needle.as_str()),
            Matcher::Contains { needle, case_sensitive: false } => {
                input.to_lowercase().contains(needle.as_str())
            }
            Matcher::WordBoundary(re) | Matcher::Regex(re) => re.is_match(input),
        }
    }

    /// Rule description for logs
    pub fn describe(&self) -> String {
        match self {
            Matcher::Contains { needle, .. } => format!("contains: {}", needle),
            Matcher::WordBoundary(re) => format!("word: {}", re.as_str()),
            Matcher::Regex(re) => format!("regex: {}", re.as_str()),
        }
    }
}

/// Intent pattern ready for matching
#[derive(Debug, Clone)]
pub struct CompiledIntentPattern {
    pub config: Arc<IntentPatternConfig>,
    pub matcher: Matcher,
    /// weight * (1 + priority / 200)
    pub score: f64,
}

impl CompiledIntentPattern {
    pub fn intent_type(&self) -> IntentType {
        self.config.intent_type
    }

    pub fn pattern(&self) -> &str {
        &self.config.pattern
    }
}

/// A pattern string that failed to compile
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedPattern {
    pub pattern: String,
    pub reason: String,
}

/// Loaded, compiled pattern book shared by every classification call
#[derive(Debug, Clone, Default)]
pub struct IntentPatternSet {
    /// Load order, which is also tie-break order
    pub patterns: Vec<CompiledIntentPattern>,
    pub rejected: Vec<RejectedPattern>,
    /// True when the hardcoded fallback patterns are in use
    pub fallback_mode: bool,
}

impl IntentPatternSet {
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn configs(&self) -> impl Iterator<Item = &IntentPatternConfig> {
        self.patterns.iter().map(|p| p.config.as_ref())
    }
}
