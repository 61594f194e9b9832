//! Search intent classification
//! Pure functions over an already-loaded pattern set. Pattern evaluation follows load
//! order, which is also the tie-break order, so results are fully deterministic.

use std::collections::BTreeMap;
use serde::Serialize;

use crate::compiler::IntentPatternSet;
use crate::config::ClassificationThresholds;
use crate::rule::{DominantIntent, IntentType};
use crate::utils::normalize_text;

/// Share of the combined title+subtitle score carried by the title
pub const TITLE_COVERAGE_WEIGHT: f64 = 0.6;
pub const SUBTITLE_COVERAGE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMatch {
    pub pattern: String,
    pub intent_type: IntentType,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIntentClassification {
    pub token: String,
    pub matches: Vec<IntentMatch>,
    pub dominant_intent: DominantIntent,
    /// Score of the winning match, 0 when unknown
    pub score: f64,
    pub fallback_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboIntentClassification {
    pub phrase: String,
    pub matches: Vec<IntentMatch>,
    /// Summed score per intent type
    pub intent_scores: BTreeMap<IntentType, f64>,
    pub dominant_intent: DominantIntent,
    /// Top intent's share of the total score, 0 when unknown
    pub dominance: f64,
    pub fallback_mode: bool,
}

fn collect_matches(text: &str, set: &IntentPatternSet) -> Vec<IntentMatch> {
    set.patterns
        .iter()
        .filter(|p| p.matcher.is_match(text))
        .map(|p| IntentMatch {
            pattern: p.pattern().to_string(),
            intent_type: p.intent_type(),
            score: p.score,
        })
        .collect()
}

/// Dominant intent of a single token: the highest-scoring match, first one on ties
pub fn classify_token_intent(token: &str, set: &IntentPatternSet) -> TokenIntentClassification {
    let token = normalize_text(token);
    let matches = if token.is_empty() { Vec::new() } else { collect_matches(&token, set) };

    let mut best: Option<&IntentMatch> = None;
    for m in &matches {
        if best.map_or(true, |b| m.score > b.score) {
            best = Some(m);
        }
    }
    let (dominant_intent, score) = match best {
        Some(m) => (DominantIntent::from(m.intent_type), m.score),
        None => (DominantIntent::Unknown, 0.0),
    };

    TokenIntentClassification {
        token,
        matches,
        dominant_intent,
        score,
        fallback_mode: set.fallback_mode,
    }
}

/// Dominant intent of a phrase from per-type score totals
pub fn classify_combo_intent(
    phrase: &str,
    set: &IntentPatternSet,
    thresholds: &ClassificationThresholds,
) -> ComboIntentClassification {
    let phrase = normalize_text(phrase);
    let matches = if phrase.is_empty() { Vec::new() } else { collect_matches(&phrase, set) };

    // First-appearance order keeps ties deterministic
    let mut totals: Vec<(IntentType, f64)> = Vec::new();
    for m in &matches {
        match totals.iter_mut().find(|(t, _)| *t == m.intent_type) {
            Some((_, total)) => *total += m.score,
            None => totals.push((m.intent_type, m.score)),
        }
    }

    let sum: f64 = totals.iter().map(|(_, s)| s).sum();
    let mut top: Option<(IntentType, f64)> = None;
    for &(intent, score) in &totals {
        if top.map_or(true, |(_, best)| score > best) {
            top = Some((intent, score));
        }
    }

    let (dominant_intent, dominance) = match top {
        None => (DominantIntent::Unknown, 0.0),
        Some((intent, _)) if totals.len() == 1 => (DominantIntent::from(intent), 1.0),
        Some((intent, score)) => {
            let share = if sum > 0.0 { score / sum } else { 0.0 };
            if share > thresholds.dominance_ratio {
                (DominantIntent::from(intent), share)
            } else {
                (DominantIntent::Mixed, share)
            }
        }
    };

    ComboIntentClassification {
        phrase,
        matches,
        intent_scores: totals.into_iter().collect(),
        dominant_intent,
        dominance,
        fallback_mode: set.fallback_mode,
    }
}

// ======== Coverage ========

/// Phrase-level coverage over a keyword/combo list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCoverage {
    /// classified / total * 100
    pub score: f64,
    pub total_phrases: usize,
    pub classified_phrases: usize,
    /// Phrase count per dominant intent, `mixed` included
    pub distribution: BTreeMap<String, usize>,
    pub classifications: Vec<ComboIntentClassification>,
    pub fallback_mode: bool,
}

/// Classify every phrase and report how many resolved to an intent
pub fn compute_intent_coverage<S: AsRef<str>>(
    phrases: &[S],
    set: &IntentPatternSet,
    thresholds: &ClassificationThresholds,
) -> IntentCoverage {
    let classifications: Vec<ComboIntentClassification> = phrases
        .iter()
        .map(|p| classify_combo_intent(p.as_ref(), set, thresholds))
        .collect();

    let mut distribution = BTreeMap::new();
    for c in classifications.iter().filter(|c| c.dominant_intent.is_classified()) {
        *distribution.entry(dominant_label(c.dominant_intent).to_string()).or_insert(0) += 1;
    }
    let classified_phrases: usize = distribution.values().sum();

    IntentCoverage {
        score: percentage(classified_phrases, classifications.len()),
        total_phrases: classifications.len(),
        classified_phrases,
        distribution,
        classifications,
        fallback_mode: set.fallback_mode,
    }
}

/// Token-level coverage of one text field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntentCoverage {
    /// classified / total * 100
    pub score: f64,
    pub total_tokens: usize,
    pub classified_tokens: usize,
    /// Percentage of classified tokens per intent type
    pub distribution: BTreeMap<IntentType, f64>,
    pub tokens: Vec<TokenIntentClassification>,
    pub fallback_mode: bool,
}

/// Classify every token; the empty input scores 0
pub fn compute_search_intent_coverage<S: AsRef<str>>(
    tokens: &[S],
    set: &IntentPatternSet,
) -> SearchIntentCoverage {
    let classifications: Vec<TokenIntentClassification> = tokens
        .iter()
        .map(|t| classify_token_intent(t.as_ref(), set))
        .collect();

    let mut counts: BTreeMap<IntentType, usize> = BTreeMap::new();
    for intent in classifications.iter().filter_map(|c| c.dominant_intent.intent_type()) {
        *counts.entry(intent).or_insert(0) += 1;
    }
    let classified_tokens: usize = counts.values().sum();
    let distribution = counts
        .into_iter()
        .map(|(intent, n)| (intent, percentage(n, classified_tokens)))
        .collect();

    SearchIntentCoverage {
        score: percentage(classified_tokens, classifications.len()),
        total_tokens: classifications.len(),
        classified_tokens,
        distribution,
        tokens: classifications,
        fallback_mode: set.fallback_mode,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedSearchIntentCoverage {
    /// title 60% + subtitle 40%
    pub score: f64,
    pub title: SearchIntentCoverage,
    pub subtitle: SearchIntentCoverage,
    pub fallback_mode: bool,
}

pub fn compute_combined_search_intent_coverage<S: AsRef<str>>(
    title_tokens: &[S],
    subtitle_tokens: &[S],
    set: &IntentPatternSet,
) -> CombinedSearchIntentCoverage {
    let title = compute_search_intent_coverage(title_tokens, set);
    let subtitle = compute_search_intent_coverage(subtitle_tokens, set);
    CombinedSearchIntentCoverage {
        score: title.score * TITLE_COVERAGE_WEIGHT + subtitle.score * SUBTITLE_COVERAGE_WEIGHT,
        fallback_mode: title.fallback_mode || subtitle.fallback_mode,
        title,
        subtitle,
    }
}

fn dominant_label(intent: DominantIntent) -> &'static str {
    match intent {
        DominantIntent::Mixed => "mixed",
        DominantIntent::Unknown => "unknown",
        other => other.intent_type().map_or("unknown", |t| t.as_str()),
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::PatternCompiler;
    use crate::rule::{fallback_intent_patterns, IntentPatternConfig};

    fn fallback_set() -> IntentPatternSet {
        PatternCompiler::compile(fallback_intent_patterns(), true)
    }

    #[test]
    fn test_fallback_token_intents() {
        let set = fallback_set();
        let expected = [
            ("learn", DominantIntent::Informational),
            ("best", DominantIntent::Commercial),
            ("download", DominantIntent::Transactional),
            ("free", DominantIntent::Transactional),
            ("official", DominantIntent::Navigational),
        ];
        for (token, intent) in expected {
            let result = classify_token_intent(token, &set);
            assert_eq!(result.dominant_intent, intent, "token {}", token);
            assert!(result.fallback_mode);
        }
        assert_eq!(classify_token_intent("spanish", &set).dominant_intent, DominantIntent::Unknown);
        assert_eq!(classify_token_intent("   ", &set).dominant_intent, DominantIntent::Unknown);
    }

    #[test]
    fn test_token_tie_goes_to_first_loaded() {
        let set = PatternCompiler::compile(
            vec![
                IntentPatternConfig::literal("pro", IntentType::Commercial, 1.0, 100),
                IntentPatternConfig::literal("pro", IntentType::Transactional, 1.0, 100),
            ],
            false,
        );
        let result = classify_token_intent("pro", &set);
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.dominant_intent, DominantIntent::Commercial);
        assert!(!result.fallback_mode);
    }

    #[test]
    fn test_combo_dominance_rule() {
        let set = fallback_set();
        let thresholds = ClassificationThresholds::default();

        // download 1.2*1.6 + free 1.0*1.5 = 3.42 vs best 1.5 -> 69.5%
        let dominant = classify_combo_intent("best free download", &set, &thresholds);
        assert_eq!(dominant.dominant_intent, DominantIntent::Transactional);
        assert!(dominant.dominance > 0.5);

        // best 1.5 vs free 1.5 -> exactly 50%, not a majority
        let mixed = classify_combo_intent("best free app", &set, &thresholds);
        assert_eq!(mixed.dominant_intent, DominantIntent::Mixed);
        assert_eq!(mixed.intent_scores.len(), 2);

        let single = classify_combo_intent("learn spanish", &set, &thresholds);
        assert_eq!(single.dominant_intent, DominantIntent::Informational);
        assert_eq!(single.dominance, 1.0);

        let unknown = classify_combo_intent("spanish words", &set, &thresholds);
        assert_eq!(unknown.dominant_intent, DominantIntent::Unknown);
        assert!(unknown.matches.is_empty());
    }

    #[test]
    fn test_combo_threshold_is_configurable() {
        let set = fallback_set();
        let strict = ClassificationThresholds { dominance_ratio: 0.75 };
        let result = classify_combo_intent("best free download", &set, &strict);
        assert_eq!(result.dominant_intent, DominantIntent::Mixed);
    }

    #[test]
    fn test_combo_classification_is_deterministic() {
        let set = fallback_set();
        let thresholds = ClassificationThresholds::default();
        let a = classify_combo_intent("how to learn guitar free", &set, &thresholds);
        let b = classify_combo_intent("how to learn guitar free", &set, &thresholds);
        assert_eq!(a, b);
    }

    #[test]
    fn test_search_intent_coverage() {
        let set = fallback_set();
        let empty: [&str; 0] = [];
        let none = compute_search_intent_coverage(&empty, &set);
        assert_eq!(none.score, 0.0);
        assert_eq!(none.total_tokens, 0);
        assert!(none.distribution.is_empty());

        let coverage = compute_search_intent_coverage(&["learn", "spanish", "free", "download"], &set);
        assert_eq!(coverage.total_tokens, 4);
        assert_eq!(coverage.classified_tokens, 3);
        assert_eq!(coverage.score, 75.0);
        assert!((coverage.distribution[&IntentType::Transactional] - 200.0 / 3.0).abs() < 1e-9);
        assert!(coverage.fallback_mode);
    }

    #[test]
    fn test_combined_coverage_weights_title() {
        let set = fallback_set();
        let combined = compute_combined_search_intent_coverage(&["learn", "free"], &["spanish", "best"], &set);
        assert_eq!(combined.title.score, 100.0);
        assert_eq!(combined.subtitle.score, 50.0);
        assert!((combined.score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_intent_coverage_counts_mixed_as_classified() {
        let set = fallback_set();
        let coverage = compute_intent_coverage(
            &["best free app", "learn spanish", "spanish words"],
            &set,
            &ClassificationThresholds::default(),
        );
        assert_eq!(coverage.total_phrases, 3);
        assert_eq!(coverage.classified_phrases, 2);
        assert_eq!(coverage.distribution["mixed"], 1);
        assert_eq!(coverage.distribution["informational"], 1);
    }
}
