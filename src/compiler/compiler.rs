//! Pattern compiler
//! Turns raw intent pattern configs into matchers. Invalid regexes are filtered out
//! and logged, so one bad pattern never breaks classification of the rest.

use std::sync::Arc;
use std::time::Instant;
use regex::RegexBuilder;
use tracing::{debug, warn};

use super::pattern::{CompiledIntentPattern, IntentPatternSet, Matcher, RejectedPattern};
use crate::error::AsoResult;
use crate::rule::IntentPatternConfig;

pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 3.0;
pub const MAX_PRIORITY: u32 = 200;

/// Intent pattern compiler
pub struct PatternCompiler;

impl PatternCompiler {
    /// Compile a pattern list, keeping load order
    pub fn compile(configs: Vec<IntentPatternConfig>, fallback_mode: bool) -> IntentPatternSet {
        let start = Instant::now();
        let mut patterns = Vec::with_capacity(configs.len());
        let mut rejected = Vec::new();

        for config in configs {
            if config.pattern.trim().is_empty() {
                rejected.push(RejectedPattern {
                    pattern: config.pattern,
                    reason: "empty pattern".to_string(),
                });
                continue;
            }
            match Self::compile_single(config) {
                Ok(compiled) => patterns.push(compiled),
                Err((pattern, reason)) => {
                    warn!("Intent pattern rejected: pattern={} error={}", pattern, reason);
                    rejected.push(RejectedPattern { pattern, reason });
                }
            }
        }

        debug!(
            "Intent patterns compiled in {:?}: {} usable, {} rejected, fallback={}",
            start.elapsed(),
            patterns.len(),
            rejected.len(),
            fallback_mode
        );

        IntentPatternSet {
            patterns,
            rejected,
            fallback_mode,
        }
    }

    /// Score a match contributes
    pub fn score(weight: f64, priority: u32) -> f64 {
        let weight = if weight.is_finite() { weight.clamp(MIN_WEIGHT, MAX_WEIGHT) } else { 1.0 };
        let priority = priority.min(MAX_PRIORITY);
        weight * (1.0 + priority as f64 / 200.0)
    }

    fn compile_single(config: IntentPatternConfig) -> Result<CompiledIntentPattern, (String, String)> {
        match Self::build_matcher(&config) {
            Ok(matcher) => Ok(CompiledIntentPattern {
                score: Self::score(config.weight, config.priority),
                matcher,
                config: Arc::new(config),
            }),
            Err(e) => Err((config.pattern, e.to_string())),
        }
    }

    fn build_matcher(config: &IntentPatternConfig) -> AsoResult<Matcher> {
        let pattern = config.pattern.trim();
        let case_insensitive = !config.case_sensitive;

        if config.is_regex {
            let regex = RegexBuilder::new(pattern).case_insensitive(case_insensitive).build()?;
            return Ok(Matcher::Regex(regex));
        }

        if config.word_boundary {
            let regex = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(pattern)))
                .case_insensitive(case_insensitive)
                .build()?;
            return Ok(Matcher::WordBoundary(regex));
        }

        let needle = if config.case_sensitive { pattern.to_string() } else { pattern.to_lowercase() };
        Ok(Matcher::Contains {
            needle,
            case_sensitive: config.case_sensitive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::IntentType;

    fn literal(p: &str, word_boundary: bool) -> IntentPatternConfig {
        IntentPatternConfig {
            word_boundary,
            ..IntentPatternConfig::literal(p, IntentType::Commercial, 1.0, 0)
        }
    }

    #[test]
    fn test_invalid_regex_is_rejected_not_fatal() {
        let configs = vec![
            IntentPatternConfig::regex("(unclosed", IntentType::Informational, 1.0, 100),
            IntentPatternConfig::literal("best", IntentType::Commercial, 1.0, 100),
        ];
        let set = PatternCompiler::compile(configs, false);
        assert_eq!(set.len(), 1);
        assert_eq!(set.rejected.len(), 1);
        assert_eq!(set.rejected[0].pattern, "(unclosed");
        assert_eq!(set.patterns[0].pattern(), "best");
    }

    #[test]
    fn test_word_boundary_vs_substring() {
        let set = PatternCompiler::compile(vec![literal("app", true), literal("app", false)], false);
        let (bounded, substring) = (&set.patterns[0].matcher, &set.patterns[1].matcher);

        assert!(bounded.is_match("best app ever"));
        assert!(!bounded.is_match("happy"));
        assert!(substring.is_match("happy"));
        assert!(substring.is_match("HAPPY"));
    }

    #[test]
    fn test_case_sensitivity() {
        let mut config = literal("PRO", true);
        config.case_sensitive = true;
        let set = PatternCompiler::compile(vec![config], false);
        assert!(set.patterns[0].matcher.is_match("Go PRO"));
        assert!(!set.patterns[0].matcher.is_match("go pro"));

        let regex = IntentPatternConfig::regex(r"^how\s+to", IntentType::Informational, 1.0, 0);
        let set = PatternCompiler::compile(vec![regex], false);
        assert!(set.patterns[0].matcher.is_match("How To Draw"));
    }

    #[test]
    fn test_score_formula_and_clamping() {
        assert_eq!(PatternCompiler::score(1.0, 0), 1.0);
        assert_eq!(PatternCompiler::score(2.0, 100), 3.0);
        assert_eq!(PatternCompiler::score(1.0, 200), 2.0);
        assert_eq!(PatternCompiler::score(10.0, 500), 6.0);
        assert_eq!(PatternCompiler::score(f64::NAN, 0), 1.0);
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        let set = PatternCompiler::compile(vec![literal("  ", true)], true);
        assert!(set.is_empty());
        assert!(set.fallback_mode);
        assert_eq!(set.rejected[0].reason, "empty pattern");
    }
}
