//! Canonical default configuration
//! The one place fallback intent patterns, generic hook triggers and stopwords are defined;
//! the pattern loader, hook classifier, combo generator and base rule set all read from here.

use once_cell::sync::Lazy;

use super::model::{HookCategory, HookPatternMap, IntentPatternConfig, IntentType};

/// (pattern, intent, weight, priority)
const FALLBACK_INTENT_TABLE: &[(&str, IntentType, f64, u32)] = &[
    // informational
    ("learn", IntentType::Informational, 1.0, 100),
    ("how to", IntentType::Informational, 1.2, 120),
    ("guide", IntentType::Informational, 1.0, 100),
    ("tutorial", IntentType::Informational, 1.0, 100),
    ("tips", IntentType::Informational, 0.8, 80),
    ("what is", IntentType::Informational, 1.0, 100),
    // commercial
    ("best", IntentType::Commercial, 1.0, 100),
    ("top", IntentType::Commercial, 0.8, 80),
    ("review", IntentType::Commercial, 1.0, 100),
    ("compare", IntentType::Commercial, 1.0, 100),
    ("vs", IntentType::Commercial, 0.8, 80),
    ("alternative", IntentType::Commercial, 0.8, 80),
    // transactional
    ("download", IntentType::Transactional, 1.2, 120),
    ("free", IntentType::Transactional, 1.0, 100),
    ("buy", IntentType::Transactional, 1.2, 120),
    ("install", IntentType::Transactional, 1.0, 100),
    ("subscribe", IntentType::Transactional, 1.0, 100),
    ("trial", IntentType::Transactional, 0.8, 80),
    // navigational
    ("official", IntentType::Navigational, 1.2, 120),
    ("login", IntentType::Navigational, 1.0, 100),
    ("sign in", IntentType::Navigational, 1.0, 100),
    ("website", IntentType::Navigational, 0.8, 80),
];

/// Hardcoded intent patterns used when the remote store is unavailable
pub fn fallback_intent_patterns() -> Vec<IntentPatternConfig> {
    FALLBACK_INTENT_TABLE
        .iter()
        .map(|(pattern, intent, weight, priority)| {
            IntentPatternConfig::literal(*pattern, *intent, *weight, *priority)
        })
        .collect()
}

const GENERIC_HOOK_TABLE: &[(HookCategory, &[&str])] = &[
    (
        HookCategory::TimeToResult,
        &["in minutes", "in days", "in weeks", "minutes a day", "fast", "quick", "instantly", "overnight"],
    ),
    (
        HookCategory::TrustSafety,
        &["secure", "safe", "private", "privacy", "trusted", "encrypted", "certified", "protected"],
    ),
    (
        HookCategory::StatusAuthority,
        &["#1", "award", "top rated", "top-rated", "leading", "expert", "millions of", "best-selling", "editor's choice"],
    ),
    (
        HookCategory::OutcomeBenefit,
        &["achieve", "improve", "boost", "master", "transform", "results", "save money", "get better"],
    ),
    (
        HookCategory::EaseOfUse,
        &["easy", "simple", "effortless", "intuitive", "one tap", "one-tap", "hassle-free"],
    ),
    (
        HookCategory::LearningEducational,
        &["learn", "lesson", "course", "study", "practice", "teach", "discover"],
    ),
];

/// Vertical-agnostic hook triggers
pub static GENERIC_HOOK_PATTERNS: Lazy<HookPatternMap> = Lazy::new(|| {
    GENERIC_HOOK_TABLE
        .iter()
        .map(|(cat, triggers)| (*cat, triggers.iter().map(|t| t.to_string()).collect()))
        .collect()
});

/// English stopwords removed before combination generation
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "for", "to", "of", "in", "on", "at", "by", "with",
    "from", "as", "is", "are", "be", "it", "its", "this", "that", "your", "you", "my", "our",
    "we", "me", "&", "+", "-", "|",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_covers_every_intent_type() {
        let patterns = fallback_intent_patterns();
        for intent in IntentType::ALL {
            assert!(patterns.iter().any(|p| p.intent_type == intent), "missing {}", intent);
        }
        assert!(patterns.iter().all(|p| (0.1..=3.0).contains(&p.weight) && p.priority <= 200));
    }

    #[test]
    fn test_generic_hooks_cover_every_category() {
        for cat in HookCategory::PRIORITY_ORDER {
            assert!(!GENERIC_HOOK_PATTERNS[&cat].is_empty());
        }
    }
}
