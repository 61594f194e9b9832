//! Rule set merge engine
//! Folds base -> vertical -> market -> client layers into one effective configuration.
//! Maps merge key-by-key, `Option` leaves are overwritten only when the later layer
//! defines them, lists are replaced, stopwords are appended.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{
    CharacterLimits, FormulaOverride, HookOverride, InheritanceChain, IntentOverride, IntentType,
    KpiOverride, MergedRuleSet, RecommendationOverride, RuleSet, RuleSetSource,
};

/// Layer-over-layer merge; `layer` has higher precedence than `self`
pub trait Merge {
    fn merge_from(&mut self, layer: &Self);
}

macro_rules! impl_replace_merge {
    ($($t:ty),* $(,)?) => {
        $(
            impl Merge for $t {
                fn merge_from(&mut self, layer: &Self) {
                    *self = layer.clone();
                }
            }
        )*
    };
}

impl_replace_merge!(f64, u8, u32, bool, String, IntentType);

impl<T: Clone> Merge for Vec<T> {
    fn merge_from(&mut self, layer: &Self) {
        *self = layer.clone();
    }
}

impl<T: Merge + Clone> Merge for Option<T> {
    fn merge_from(&mut self, layer: &Self) {
        let Some(value) = layer else {
            return;
        };
        match self {
            Some(current) => current.merge_from(value),
            None => *self = Some(value.clone()),
        }
    }
}

impl<K: Ord + Clone, V: Merge + Clone> Merge for BTreeMap<K, V> {
    fn merge_from(&mut self, layer: &Self) {
        for (key, value) in layer {
            match self.get_mut(key) {
                Some(current) => current.merge_from(value),
                None => {
                    self.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

impl Merge for KpiOverride {
    fn merge_from(&mut self, layer: &Self) {
        self.weight.merge_from(&layer.weight);
        self.enabled.merge_from(&layer.enabled);
    }
}

impl Merge for FormulaOverride {
    fn merge_from(&mut self, layer: &Self) {
        self.multipliers.merge_from(&layer.multipliers);
        self.thresholds.merge_from(&layer.thresholds);
    }
}

impl Merge for IntentOverride {
    fn merge_from(&mut self, layer: &Self) {
        self.intent_type.merge_from(&layer.intent_type);
        self.patterns.merge_from(&layer.patterns);
        self.weight.merge_from(&layer.weight);
        self.priority.merge_from(&layer.priority);
    }
}

impl Merge for HookOverride {
    fn merge_from(&mut self, layer: &Self) {
        self.patterns.merge_from(&layer.patterns);
        self.weight.merge_from(&layer.weight);
    }
}

impl Merge for RecommendationOverride {
    fn merge_from(&mut self, layer: &Self) {
        self.message.merge_from(&layer.message);
        self.priority.merge_from(&layer.priority);
        self.enabled.merge_from(&layer.enabled);
    }
}

impl Merge for CharacterLimits {
    fn merge_from(&mut self, layer: &Self) {
        self.title.merge_from(&layer.title);
        self.subtitle.merge_from(&layer.subtitle);
        self.keywords.merge_from(&layer.keywords);
        self.description.merge_from(&layer.description);
    }
}

impl Merge for RuleSet {
    fn merge_from(&mut self, layer: &Self) {
        // Identity follows the most specific layer
        self.id = layer.id.clone();
        if !layer.label.is_empty() {
            self.label = layer.label.clone();
        }
        self.source = layer.source;
        self.version = self.version.max(layer.version);
        self.vertical.merge_from(&layer.vertical);
        self.market.merge_from(&layer.market);

        self.kpi_overrides.merge_from(&layer.kpi_overrides);
        self.formula_overrides.merge_from(&layer.formula_overrides);
        self.intent_overrides.merge_from(&layer.intent_overrides);
        self.hook_overrides.merge_from(&layer.hook_overrides);
        self.token_relevance_overrides.merge_from(&layer.token_relevance_overrides);
        self.recommendation_overrides.merge_from(&layer.recommendation_overrides);
        self.character_limits.merge_from(&layer.character_limits);

        // Stopwords are additive across layers
        self.stopword_overrides.extend(layer.stopword_overrides.iter().cloned());
    }
}

/// Merge layers supplied in increasing precedence order.
/// The order is the caller's responsibility; `source` only decides the chain slot.
pub fn merge_rule_sets(layers: &[&RuleSet]) -> MergedRuleSet {
    let mut merged = RuleSet::new("", RuleSetSource::Base);
    merged.version = 0;
    let mut chain = InheritanceChain::default();

    for layer in layers {
        merged.merge_from(layer);
        *chain.slot_mut(layer.source) = Some(layer.to_ref());
    }

    debug!(
        "Merged {} rule set layers into [{}]: {} kpi, {} intent, {} token, {} stopwords",
        layers.len(),
        merged.id,
        merged.kpi_overrides.len(),
        merged.intent_overrides.len(),
        merged.token_relevance_overrides.len(),
        merged.stopword_overrides.len()
    );

    MergedRuleSet {
        rule_set: merged,
        inheritance_chain: chain,
        merged_at: Some(Utc::now()),
        leak_warnings: Vec::new(),
    }
}

/// Structural validation; returns human-readable errors, never panics
pub fn validate_merged_rule_set(merged: &MergedRuleSet) -> Vec<String> {
    let mut errors = Vec::new();

    if merged.rule_set.id.trim().is_empty() {
        errors.push("Merged rule set is missing an id".to_string());
    }
    if merged.merged_at.is_none() {
        errors.push("Merged rule set is missing its mergedAt timestamp".to_string());
    }
    if merged.inheritance_chain.is_empty() {
        errors.push("Merged rule set is missing its inheritance chain".to_string());
    }

    for (kpi, ov) in &merged.rule_set.kpi_overrides {
        if let Some(weight) = ov.weight {
            if !weight.is_finite() || weight < 0.0 {
                errors.push(format!("KPI override '{}' has an invalid weight {}", kpi, weight));
            }
        }
    }
    for (key, ov) in &merged.rule_set.intent_overrides {
        if let Some(weight) = ov.weight {
            if !(0.1..=3.0).contains(&weight) {
                errors.push(format!("Intent override '{}' weight {} is outside 0.1-3.0", key, weight));
            }
        }
    }

    errors
}

/// Compact description of a merged rule set for UI/logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRuleSetSummary {
    pub id: String,
    pub label: String,
    pub vertical: String,
    pub market: Option<String>,
    /// Layer ids, lowest precedence first
    pub inheritance: Vec<String>,
    pub kpi_overrides: usize,
    pub formula_overrides: usize,
    pub intent_overrides: usize,
    pub hook_overrides: usize,
    pub token_relevance_overrides: usize,
    pub stopwords: usize,
    pub recommendation_overrides: usize,
    pub leak_warnings: usize,
    pub merged_at: Option<DateTime<Utc>>,
}

pub fn get_merged_rule_set_summary(merged: &MergedRuleSet) -> MergedRuleSetSummary {
    let rs = &merged.rule_set;
    MergedRuleSetSummary {
        id: rs.id.clone(),
        label: rs.label.clone(),
        vertical: merged.vertical_id().to_string(),
        market: rs.market.clone(),
        inheritance: merged
            .inheritance_chain
            .layers()
            .into_iter()
            .map(|(_, r)| r.id.clone())
            .collect(),
        kpi_overrides: rs.kpi_overrides.len(),
        formula_overrides: rs.formula_overrides.len(),
        intent_overrides: rs.intent_overrides.len(),
        hook_overrides: rs.hook_overrides.len(),
        token_relevance_overrides: rs.token_relevance_overrides.len(),
        stopwords: rs.stopword_overrides.len(),
        recommendation_overrides: rs.recommendation_overrides.len(),
        leak_warnings: merged.leak_warnings.len(),
        merged_at: merged.merged_at,
    }
}

pub const KPI_SCHEMA_VERSION: &str = "1.0";
pub const FORMULA_SCHEMA_VERSION: &str = "1.0";

/// Row of the remote version/audit table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetVersionRecord {
    pub ruleset_version: u32,
    pub vertical_version: Option<u32>,
    pub market_version: Option<u32>,
    pub client_version: Option<u32>,
    pub kpi_schema_version: String,
    pub formula_schema_version: String,
    pub snapshot: serde_json::Value,
}

impl MergedRuleSet {
    /// Audit row for the version table, carrying a full JSON snapshot
    pub fn to_version_record(&self) -> RuleSetVersionRecord {
        let chain = &self.inheritance_chain;
        RuleSetVersionRecord {
            ruleset_version: self.rule_set.version,
            vertical_version: chain.vertical.as_ref().map(|r| r.version),
            market_version: chain.market.as_ref().map(|r| r.version),
            client_version: chain.client.as_ref().map(|r| r.version),
            kpi_schema_version: KPI_SCHEMA_VERSION.to_string(),
            formula_schema_version: FORMULA_SCHEMA_VERSION.to_string(),
            snapshot: serde_json::to_value(self).unwrap_or(serde_json::Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kpi(weight: f64) -> KpiOverride {
        KpiOverride { weight: Some(weight), enabled: None }
    }

    fn layer(id: &str, source: RuleSetSource, pairs: &[(&str, f64)]) -> RuleSet {
        let mut rs = RuleSet::new(id, source);
        for (k, v) in pairs {
            rs.kpi_overrides.insert(k.to_string(), kpi(*v));
        }
        rs
    }

    fn weight_of(merged: &MergedRuleSet, key: &str) -> Option<f64> {
        merged.rule_set.kpi_overrides.get(key).and_then(|o| o.weight)
    }

    #[test]
    fn test_later_layers_win_and_missing_keys_fall_through() {
        let base = layer("base", RuleSetSource::Base, &[("a", 1.0)]);
        let vertical = layer("v", RuleSetSource::Vertical, &[("a", 2.0), ("b", 1.0)]);
        let market = layer("m", RuleSetSource::Market, &[("b", 2.0)]);
        let client = layer("c", RuleSetSource::Client, &[]);

        let merged = merge_rule_sets(&[&base, &vertical, &market, &client]);
        assert_eq!(weight_of(&merged, "a"), Some(2.0));
        assert_eq!(weight_of(&merged, "b"), Some(2.0));
        assert_eq!(merged.rule_set.kpi_overrides.len(), 2);
    }

    #[test]
    fn test_precedence_falls_back_layer_by_layer() {
        let base = layer("base", RuleSetSource::Base, &[("k", 1.0)]);
        let vertical = layer("v", RuleSetSource::Vertical, &[("k", 2.0)]);
        let market = layer("m", RuleSetSource::Market, &[("k", 3.0)]);
        let client = layer("c", RuleSetSource::Client, &[("k", 4.0)]);

        assert_eq!(weight_of(&merge_rule_sets(&[&base, &vertical, &market, &client]), "k"), Some(4.0));
        assert_eq!(weight_of(&merge_rule_sets(&[&base, &vertical, &market]), "k"), Some(3.0));
        assert_eq!(weight_of(&merge_rule_sets(&[&base, &vertical]), "k"), Some(2.0));
        assert_eq!(weight_of(&merge_rule_sets(&[&base]), "k"), Some(1.0));
    }

    #[test]
    fn test_stopwords_are_concatenated_without_dedup() {
        let mut base = RuleSet::new("base", RuleSetSource::Base);
        base.stopword_overrides = vec!["the".into(), "and".into()];
        let mut vertical = RuleSet::new("v", RuleSetSource::Vertical);
        vertical.stopword_overrides = vec!["app".into(), "the".into()];

        let merged = merge_rule_sets(&[&base, &vertical]);
        assert_eq!(merged.rule_set.stopword_overrides, vec!["the", "and", "app", "the"]);
    }

    #[test]
    fn test_nested_maps_merge_and_lists_replace() {
        let mut base = RuleSet::new("base", RuleSetSource::Base);
        base.formula_overrides.insert(
            "relevance".into(),
            FormulaOverride {
                multipliers: Some(BTreeMap::from([("title".into(), 1.0), ("subtitle".into(), 0.5)])),
                thresholds: None,
            },
        );
        base.intent_overrides.insert(
            "informational".into(),
            IntentOverride {
                patterns: Some(vec!["learn".into(), "guide".into()]),
                weight: Some(1.0),
                ..Default::default()
            },
        );

        let mut vertical = RuleSet::new("v", RuleSetSource::Vertical);
        vertical.formula_overrides.insert(
            "relevance".into(),
            FormulaOverride {
                multipliers: Some(BTreeMap::from([("title".into(), 1.5)])),
                thresholds: None,
            },
        );
        vertical.intent_overrides.insert(
            "informational".into(),
            IntentOverride {
                patterns: Some(vec!["lesson".into()]),
                ..Default::default()
            },
        );

        let merged = merge_rule_sets(&[&base, &vertical]);
        let multipliers = merged.rule_set.formula_overrides["relevance"].multipliers.clone().unwrap();
        assert_eq!(multipliers["title"], 1.5);
        assert_eq!(multipliers["subtitle"], 0.5);

        let intent = &merged.rule_set.intent_overrides["informational"];
        assert_eq!(intent.patterns.as_deref(), Some(&["lesson".to_string()][..]));
        assert_eq!(intent.weight, Some(1.0));
    }

    #[test]
    fn test_chain_records_present_layers_only() {
        let base = layer("base", RuleSetSource::Base, &[]);
        let client = layer("acme", RuleSetSource::Client, &[]);
        let merged = merge_rule_sets(&[&base, &client]);

        let chain = &merged.inheritance_chain;
        assert_eq!(chain.base.as_ref().map(|r| r.id.as_str()), Some("base"));
        assert!(chain.vertical.is_none());
        assert!(chain.market.is_none());
        assert_eq!(chain.client.as_ref().map(|r| r.id.as_str()), Some("acme"));
        assert_eq!(merged.rule_set.id, "acme");
    }

    #[test]
    fn test_validate_reports_structural_errors() {
        let merged = merge_rule_sets(&[&layer("base", RuleSetSource::Base, &[])]);
        assert!(validate_merged_rule_set(&merged).is_empty());

        let empty = merge_rule_sets(&[]);
        let errors = validate_merged_rule_set(&empty);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("id")));
        assert!(errors.iter().any(|e| e.contains("inheritance chain")));

        let mut no_ts = merged.clone();
        no_ts.merged_at = None;
        assert_eq!(validate_merged_rule_set(&no_ts).len(), 1);
    }

    #[test]
    fn test_summary_and_version_record() {
        let mut base = layer("base", RuleSetSource::Base, &[("a", 1.0)]);
        base.version = 3;
        let mut vertical = layer("language_learning", RuleSetSource::Vertical, &[]);
        vertical.version = 2;
        vertical.vertical = Some("language_learning".into());

        let merged = merge_rule_sets(&[&base, &vertical]);
        let summary = get_merged_rule_set_summary(&merged);
        assert_eq!(summary.inheritance, vec!["base", "language_learning"]);
        assert_eq!(summary.vertical, "language_learning");
        assert_eq!(summary.kpi_overrides, 1);

        let record = merged.to_version_record();
        assert_eq!(record.ruleset_version, 3);
        assert_eq!(record.vertical_version, Some(2));
        assert_eq!(record.market_version, None);
        assert_eq!(record.snapshot["id"], "language_learning");
    }
}
