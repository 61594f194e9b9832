//! Vertical leak detection
//! Read-only scans of a merged rule set for configuration that belongs to another
//! vertical. Warnings are diagnostics only: nothing here fails or blocks a merge.

use std::collections::{BTreeMap, BTreeSet};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::LeakThresholds;
use crate::profile::{map_category_to_vertical, BASE_VERTICAL_ID};
use crate::rule::{
    AppMetadata, LeakWarning, LeakWarningType, MergedRuleSet, RuleSetStore, Severity, BUILTIN_STORE,
};

/// Token relevance at or above which a token counts as a vertical signal
pub const HIGH_RELEVANCE: u8 = 2;

/// Enabled KPI weights are expected to sum to 1 within this tolerance
const KPI_WEIGHT_TOLERANCE: f64 = 0.05;

/// Hand-picked signatures of the verticals whose leaks users notice first
struct NamedLeakCheck {
    vertical_id: &'static str,
    expected_categories: &'static [&'static str],
    intent_key_markers: &'static [&'static str],
    tokens: &'static [&'static str],
    recommendation_phrases: &'static [&'static str],
}

static NAMED_LEAK_CHECKS: &[NamedLeakCheck] = &[
    NamedLeakCheck {
        vertical_id: "language_learning",
        expected_categories: &["Education", "Reference"],
        intent_key_markers: &["learning", "language", "lesson", "fluency"],
        tokens: &["learn", "lesson", "fluent", "vocabulary", "grammar"],
        recommendation_phrases: &["learn spanish", "learn a language", "fluent"],
    },
    NamedLeakCheck {
        vertical_id: "rewards",
        expected_categories: &["Lifestyle", "Shopping"],
        intent_key_markers: &["reward", "cashback", "points"],
        tokens: &["rewards", "cashback", "earn", "redeem"],
        recommendation_phrases: &["earn rewards", "cash back", "gift cards"],
    },
    NamedLeakCheck {
        vertical_id: "finance",
        expected_categories: &["Finance", "Business"],
        intent_key_markers: &["budget", "invest", "banking", "expense"],
        tokens: &["budget", "invest", "stocks", "portfolio"],
        recommendation_phrases: &["budget planner", "track your spending", "invest in"],
    },
];

impl NamedLeakCheck {
    fn applies_to(&self, merged: &MergedRuleSet, metadata: &AppMetadata) -> bool {
        if merged.vertical_id() == self.vertical_id {
            return false;
        }
        match metadata.category.as_deref() {
            Some(category) => !self
                .expected_categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category.trim())),
            None => true,
        }
    }

    fn run(&self, merged: &MergedRuleSet, warnings: &mut Vec<LeakWarning>) {
        let rule_set = &merged.rule_set;

        let intent_keys: Vec<&str> = rule_set
            .intent_overrides
            .keys()
            .map(String::as_str)
            .filter(|key| {
                let key = key.to_lowercase();
                self.intent_key_markers.iter().any(|m| key.contains(m))
            })
            .collect();
        if !intent_keys.is_empty() {
            warnings.push(LeakWarning {
                kind: LeakWarningType::PatternLeak,
                severity: Severity::Medium,
                message: format!("Intent patterns from the {} vertical found", self.vertical_id),
                details: json!({ "leakedVertical": self.vertical_id, "intentKeys": intent_keys }),
            });
        }

        let tokens: Vec<&str> = self
            .tokens
            .iter()
            .copied()
            .filter(|t| rule_set.token_relevance_overrides.get(*t).is_some_and(|r| *r >= HIGH_RELEVANCE))
            .collect();
        if !tokens.is_empty() {
            warnings.push(LeakWarning {
                kind: LeakWarningType::PatternLeak,
                severity: Severity::Low,
                message: format!("High-relevance tokens from the {} vertical found", self.vertical_id),
                details: json!({ "leakedVertical": self.vertical_id, "tokens": tokens }),
            });
        }

        let recommendations: Vec<&str> = rule_set
            .recommendation_overrides
            .iter()
            .filter(|(_, rec)| {
                let message = rec.message.as_deref().unwrap_or("").to_lowercase();
                self.recommendation_phrases.iter().any(|p| message.contains(p))
            })
            .map(|(key, _)| key.as_str())
            .collect();
        if !recommendations.is_empty() {
            warnings.push(LeakWarning {
                kind: LeakWarningType::RecommendationLeak,
                severity: Severity::High,
                message: format!("Recommendations contain {} example copy", self.vertical_id),
                details: json!({ "leakedVertical": self.vertical_id, "recommendations": recommendations }),
            });
        }
    }
}

/// Token and intent keys that identify one vertical
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalSignature {
    pub vertical_id: String,
    pub tokens: BTreeSet<String>,
    pub intents: BTreeSet<String>,
}

/// Leak detector holding per-vertical signatures, built once
pub struct LeakDetector {
    signatures: Vec<VerticalSignature>,
    thresholds: LeakThresholds,
}

static DEFAULT_DETECTOR: Lazy<LeakDetector> =
    Lazy::new(|| LeakDetector::new(&BUILTIN_STORE, LeakThresholds::default()));

impl LeakDetector {
    pub fn new(store: &RuleSetStore, thresholds: LeakThresholds) -> Self {
        let signatures = store
            .verticals()
            .filter(|(id, _)| *id != BASE_VERTICAL_ID)
            .map(|(id, rs)| VerticalSignature {
                vertical_id: id.to_string(),
                tokens: rs.token_relevance_overrides.keys().cloned().collect(),
                intents: rs.intent_overrides.keys().cloned().collect(),
            })
            .collect::<Vec<_>>();
        debug!("Leak detector built with {} vertical signatures", signatures.len());
        Self { signatures, thresholds }
    }

    pub fn signatures(&self) -> &[VerticalSignature] {
        &self.signatures
    }

    /// Named-vertical leaks followed by cross-vertical signature overlap
    pub fn detect_vertical_leak(&self, merged: &MergedRuleSet, metadata: &AppMetadata) -> Vec<LeakWarning> {
        let mut warnings = detect_named_vertical_leaks(merged, metadata);
        warnings.extend(self.detect_signature_overlap(merged));
        warnings
    }

    /// Overlap of the rule set's own keys with every other vertical's signature
    pub fn detect_signature_overlap(&self, merged: &MergedRuleSet) -> Vec<LeakWarning> {
        let own_vertical = merged.vertical_id();
        let tokens = &merged.rule_set.token_relevance_overrides;
        let intents = &merged.rule_set.intent_overrides;
        let t = &self.thresholds;

        let mut warnings = Vec::new();
        for signature in self.signatures.iter().filter(|s| s.vertical_id != own_vertical) {
            let token_overlap: Vec<&str> = signature
                .tokens
                .iter()
                .filter(|k| tokens.contains_key(k.as_str()))
                .map(String::as_str)
                .collect();
            let intent_overlap: Vec<&str> = signature
                .intents
                .iter()
                .filter(|k| intents.contains_key(k.as_str()))
                .map(String::as_str)
                .collect();

            if token_overlap.len() < t.token_medium && intent_overlap.len() < t.intent_medium {
                continue;
            }
            let severity = if token_overlap.len() >= t.token_high || intent_overlap.len() >= t.intent_high {
                Severity::High
            } else {
                Severity::Medium
            };
            warnings.push(LeakWarning {
                kind: LeakWarningType::PatternLeak,
                severity,
                message: format!(
                    "Rule set shares {} tokens and {} intent keys with the {} vertical",
                    token_overlap.len(),
                    intent_overlap.len(),
                    signature.vertical_id
                ),
                details: json!({
                    "leakedVertical": signature.vertical_id,
                    "tokenOverlap": token_overlap,
                    "intentOverlap": intent_overlap,
                }),
            });
        }
        warnings
    }

    /// Append every diagnostic for `metadata` to the merged rule set
    pub fn apply_leak_detection(&self, merged: &mut MergedRuleSet, metadata: &AppMetadata) {
        let mut warnings = Vec::new();
        warnings.extend(detect_vertical_mismatch(merged, metadata));
        warnings.extend(self.detect_vertical_leak(merged, metadata));
        warnings.extend(detect_kpi_anomaly(merged));

        for w in warnings.iter().filter(|w| w.severity == Severity::High) {
            warn!("Rule set {} leak: {}", merged.rule_set.id, w.message);
        }
        debug!("Leak detection on {} added {} warnings", merged.rule_set.id, warnings.len());
        merged.leak_warnings.extend(warnings);
    }
}

/// Leaks of the hand-picked verticals, skipped where the app's category expects them
pub fn detect_named_vertical_leaks(merged: &MergedRuleSet, metadata: &AppMetadata) -> Vec<LeakWarning> {
    let mut warnings = Vec::new();
    for check in NAMED_LEAK_CHECKS.iter().filter(|c| c.applies_to(merged, metadata)) {
        check.run(merged, &mut warnings);
    }
    warnings
}

/// Leak scan against the built-in vertical signatures and default thresholds
pub fn detect_vertical_leak(merged: &MergedRuleSet, metadata: &AppMetadata) -> Vec<LeakWarning> {
    DEFAULT_DETECTOR.detect_vertical_leak(merged, metadata)
}

/// Built-in detector flavour of [`LeakDetector::apply_leak_detection`]
pub fn apply_leak_detection(merged: &mut MergedRuleSet, metadata: &AppMetadata) {
    DEFAULT_DETECTOR.apply_leak_detection(merged, metadata)
}

/// Assigned vertical disagrees with what the app category implies; base always passes
pub fn detect_vertical_mismatch(merged: &MergedRuleSet, metadata: &AppMetadata) -> Option<LeakWarning> {
    let assigned = merged.vertical_id();
    if assigned == BASE_VERTICAL_ID {
        return None;
    }
    let category = metadata.category.as_deref()?;
    let expected: Vec<&str> = map_category_to_vertical(category).iter().map(|p| p.id).collect();
    if expected.is_empty() || expected.contains(&assigned) {
        return None;
    }
    Some(LeakWarning {
        kind: LeakWarningType::VerticalMismatch,
        severity: Severity::Medium,
        message: format!("Vertical {} does not match app category {}", assigned, category),
        details: json!({ "assignedVertical": assigned, "category": category, "expectedVerticals": expected }),
    })
}

/// Enabled KPI weights that no longer sum to 1
pub fn detect_kpi_anomaly(merged: &MergedRuleSet) -> Option<LeakWarning> {
    let enabled: Vec<f64> = merged
        .rule_set
        .kpi_overrides
        .values()
        .filter(|k| k.enabled.unwrap_or(true))
        .filter_map(|k| k.weight)
        .collect();
    if enabled.is_empty() {
        return None;
    }
    let sum: f64 = enabled.iter().sum();
    if (sum - 1.0).abs() <= KPI_WEIGHT_TOLERANCE {
        return None;
    }
    Some(LeakWarning {
        kind: LeakWarningType::KpiAnomaly,
        severity: Severity::Low,
        message: format!("Enabled KPI weights sum to {:.2}", sum),
        details: json!({ "weightSum": sum }),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakDetectionSummary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<LeakWarningType, usize>,
    pub highest_severity: Option<Severity>,
    pub leaked_verticals: BTreeSet<String>,
}

pub fn get_leak_detection_summary(warnings: &[LeakWarning]) -> LeakDetectionSummary {
    let mut by_severity = BTreeMap::new();
    let mut by_type = BTreeMap::new();
    let mut leaked_verticals = BTreeSet::new();
    for w in warnings {
        *by_severity.entry(w.severity).or_insert(0) += 1;
        *by_type.entry(w.kind).or_insert(0) += 1;
        if let Some(v) = w.details.get("leakedVertical").and_then(|v| v.as_str()) {
            leaked_verticals.insert(v.to_string());
        }
    }
    LeakDetectionSummary {
        total: warnings.len(),
        highest_severity: warnings.iter().map(|w| w.severity).max(),
        by_severity,
        by_type,
        leaked_verticals,
    }
}
