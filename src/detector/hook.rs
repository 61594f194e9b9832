//! Psychological hook classification
//! Categories are tested in a fixed priority order and the first one whose
//! triggers appear in the text wins.

use std::collections::BTreeMap;
use serde::Serialize;
use tracing::debug;

use crate::rule::{
    validate_merged_rule_set, HookCategory, HookPatternMap, MergedRuleSet, GENERIC_HOOK_PATTERNS,
};

/// Triggers per category: rule set overrides where defined, generic triggers elsewhere.
/// A rule set that fails validation contributes nothing.
pub fn resolve_hook_patterns(rules: Option<&MergedRuleSet>) -> HookPatternMap {
    let mut patterns = GENERIC_HOOK_PATTERNS.clone();
    if let Some(rules) = rules {
        let errors = validate_merged_rule_set(rules);
        if errors.is_empty() {
            patterns.extend(rules.hook_patterns());
        } else {
            debug!("Hook overrides of '{}' ignored: {}", rules.rule_set.id, errors.join("; "));
        }
    }
    patterns
}

fn classify_with(text: &str, patterns: &HookPatternMap) -> Option<HookCategory> {
    let text = text.to_lowercase();
    if text.trim().is_empty() {
        return None;
    }
    HookCategory::PRIORITY_ORDER.into_iter().find(|category| {
        patterns
            .get(category)
            .is_some_and(|triggers| triggers.iter().any(|t| !t.is_empty() && text.contains(&t.to_lowercase())))
    })
}

/// First hook category whose triggers occur in `text`
pub fn classify_hook(text: &str, rules: Option<&MergedRuleSet>) -> Option<HookCategory> {
    classify_with(text, &resolve_hook_patterns(rules))
}

/// Hook counts over a list of texts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookDistribution {
    /// Every category, zero counts included
    pub counts: BTreeMap<HookCategory, usize>,
    pub unclassified: usize,
    pub total: usize,
}

impl HookDistribution {
    pub fn categories_present(&self) -> usize {
        self.counts.values().filter(|&&n| n > 0).count()
    }

    /// Most frequent category; ties go to the higher-priority category
    pub fn dominant_category(&self) -> Option<HookCategory> {
        let mut best: Option<(HookCategory, usize)> = None;
        for category in HookCategory::PRIORITY_ORDER {
            let count = self.counts.get(&category).copied().unwrap_or(0);
            if count > 0 && best.map_or(true, |(_, n)| count > n) {
                best = Some((category, count));
            }
        }
        best.map(|(category, _)| category)
    }
}

pub fn classify_hook_distribution<S: AsRef<str>>(texts: &[S], rules: Option<&MergedRuleSet>) -> HookDistribution {
    let patterns = resolve_hook_patterns(rules);
    let mut counts: BTreeMap<HookCategory, usize> =
        HookCategory::PRIORITY_ORDER.into_iter().map(|c| (c, 0)).collect();
    let mut unclassified = 0;

    for text in texts {
        match classify_with(text.as_ref(), &patterns) {
            Some(category) => *counts.entry(category).or_insert(0) += 1,
            None => unclassified += 1,
        }
    }

    HookDistribution {
        counts,
        unclassified,
        total: texts.len(),
    }
}

/// categories present / 6 * 100
pub fn calculate_hook_diversity_score(distribution: &HookDistribution) -> f64 {
    distribution.categories_present() as f64 / HookCategory::PRIORITY_ORDER.len() as f64 * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookClassificationSummary {
    pub distribution: HookDistribution,
    pub diversity_score: f64,
    pub dominant_category: Option<HookCategory>,
    pub classified: usize,
}

pub fn get_hook_classification_summary<S: AsRef<str>>(
    texts: &[S],
    rules: Option<&MergedRuleSet>,
) -> HookClassificationSummary {
    let distribution = classify_hook_distribution(texts, rules);
    HookClassificationSummary {
        diversity_score: calculate_hook_diversity_score(&distribution),
        dominant_category: distribution.dominant_category(),
        classified: distribution.total - distribution.unclassified,
        distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{merge_rule_sets, HookOverride, RuleSet, RuleSetSource};

    #[test]
    fn test_priority_order_decides() {
        // "fast" (time_to_result) outranks "easy" (ease_of_use) and "learn"
        assert_eq!(
            classify_hook("Learn Spanish fast and easy", None),
            Some(HookCategory::TimeToResult)
        );
        assert_eq!(classify_hook("Easy lessons", None), Some(HookCategory::EaseOfUse));
        assert_eq!(classify_hook("Spanish", None), None);
        assert_eq!(classify_hook("", None), None);
    }

    #[test]
    fn test_rule_set_overrides_replace_category_triggers() {
        let mut vertical = RuleSet::new("vertical_rewards", RuleSetSource::Vertical);
        vertical.hook_overrides.insert(
            HookCategory::OutcomeBenefit,
            HookOverride {
                patterns: Some(vec!["cash back".to_string()]),
                weight: None,
            },
        );
        let merged = merge_rule_sets(&[&RuleSet::new("base", RuleSetSource::Base), &vertical]);

        assert_eq!(classify_hook("Earn cash back", Some(&merged)), Some(HookCategory::OutcomeBenefit));
        assert_eq!(classify_hook("Earn cash back", None), None);
        // Untouched categories keep generic triggers
        assert_eq!(classify_hook("Simple budgeting", Some(&merged)), Some(HookCategory::EaseOfUse));
    }

    #[test]
    fn test_invalid_rule_set_falls_back_to_generic_triggers() {
        let mut vertical = RuleSet::new("vertical_rewards", RuleSetSource::Vertical);
        vertical.hook_overrides.insert(
            HookCategory::OutcomeBenefit,
            HookOverride {
                patterns: Some(vec!["cash back".to_string()]),
                weight: None,
            },
        );
        let mut merged = merge_rule_sets(&[&RuleSet::new("base", RuleSetSource::Base), &vertical]);
        merged.merged_at = None;
        assert!(!validate_merged_rule_set(&merged).is_empty());

        assert_eq!(classify_hook("Earn cash back", Some(&merged)), None);
        assert_eq!(classify_hook("Easy lessons", Some(&merged)), Some(HookCategory::EaseOfUse));
    }

    #[test]
    fn test_distribution_and_diversity() {
        let texts = ["Learn fast", "Easy to use", "Simple setup", "Spanish"];
        let summary = get_hook_classification_summary(&texts, None);

        assert_eq!(summary.distribution.total, 4);
        assert_eq!(summary.distribution.unclassified, 1);
        assert_eq!(summary.classified, 3);
        assert_eq!(summary.distribution.counts[&HookCategory::EaseOfUse], 2);
        assert_eq!(summary.distribution.counts[&HookCategory::TrustSafety], 0);
        assert_eq!(summary.dominant_category, Some(HookCategory::EaseOfUse));
        assert!((summary.diversity_score - 2.0 / 6.0 * 100.0).abs() < 1e-9);

        let empty: [&str; 0] = [];
        let none = get_hook_classification_summary(&empty, None);
        assert_eq!(none.diversity_score, 0.0);
        assert_eq!(none.dominant_category, None);
    }
}
