//! Rule engine facade
//! Wires detection -> rule set merge -> leak detection -> classification for one app.
//! Built once at startup and shared; holds no global state.

use std::collections::HashSet;
use std::sync::Arc;
use serde::Serialize;
use tracing::{debug, info};

use crate::combo::{analyze_all_combos, ComboAnalysis, ComboAnalysisOptions, ComboOptions};
use crate::compiler::{IntentPatternSet, PatternCompiler};
use crate::config::GlobalConfig;
use crate::detector::{
    compute_combined_search_intent_coverage, compute_intent_coverage, detect_market, detect_vertical,
    get_hook_classification_summary, get_leak_detection_summary, CombinedSearchIntentCoverage,
    HookClassificationSummary, IntentCoverage, LeakDetectionSummary, LeakDetector, MarketDetection,
    VerticalDetection,
};
use crate::error::AsoResult;
use crate::profile::DEFAULT_MARKET_ID;
use crate::rule::{
    validate_merged_rule_set, AppMetadata, IntentPatternService, MergedRuleSet, PatternScope,
    PatternSource, RuleSet, RuleSetStore,
};
use crate::utils::tokenize;

/// Detected scope plus the merged, leak-checked rule set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRuleSet {
    pub vertical: VerticalDetection,
    pub market: MarketDetection,
    pub merged: MergedRuleSet,
    /// Structural problems; empty when the merge is sound
    pub validation_errors: Vec<String>,
}

/// Everything the engine derives for one piece of app metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub resolved: ResolvedRuleSet,
    pub search_intent: CombinedSearchIntentCoverage,
    pub combo_intent: IntentCoverage,
    pub hooks: HookClassificationSummary,
    pub combos: ComboAnalysis,
    pub leaks: LeakDetectionSummary,
    /// Hardcoded fallback patterns were used
    pub fallback_mode: bool,
}

pub struct RuleEngine {
    config: GlobalConfig,
    store: Arc<RuleSetStore>,
    patterns: IntentPatternService,
    leak_detector: LeakDetector,
}

impl RuleEngine {
    /// Engine over the built-in rule sets, pattern source taken from config
    pub fn new(config: GlobalConfig) -> AsoResult<Self> {
        let patterns = IntentPatternService::from_config(&config)?;
        Ok(Self::assemble(config, Arc::new(RuleSetStore::builtin()), patterns))
    }

    /// Engine with an explicit store and pattern source
    pub fn with_parts(config: GlobalConfig, store: RuleSetStore, source: Arc<dyn PatternSource>) -> Self {
        let patterns = IntentPatternService::new(source, &config);
        Self::assemble(config, Arc::new(store), patterns)
    }

    fn assemble(config: GlobalConfig, store: Arc<RuleSetStore>, patterns: IntentPatternService) -> Self {
        let leak_detector = LeakDetector::new(&store, config.leak);
        info!(
            "Rule engine ready: {} vertical rule sets, pattern cache ttl {:?}",
            store.verticals().count(),
            config.pattern_cache_ttl
        );
        Self {
            config,
            store,
            patterns,
            leak_detector,
        }
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn store(&self) -> &RuleSetStore {
        &self.store
    }

    pub fn pattern_service(&self) -> &IntentPatternService {
        &self.patterns
    }

    pub fn leak_detector(&self) -> &LeakDetector {
        &self.leak_detector
    }

    /// Admin action: the next load refetches patterns
    pub fn clear_intent_pattern_cache(&self) {
        self.patterns.invalidate();
    }

    /// Detect vertical and market, merge their layers and attach leak warnings
    pub fn resolve_rule_set(&self, metadata: &AppMetadata, client: Option<&RuleSet>) -> ResolvedRuleSet {
        // 1. Detect scope
        let vertical = detect_vertical(metadata);
        let market = match metadata.locale.as_deref() {
            Some(locale) => detect_market(locale),
            None => detect_market(DEFAULT_MARKET_ID),
        };

        // 2. Merge layers
        let mut merged = self.store.merge_for(vertical.vertical_id, market.market_id, client);

        // 3. Diagnostics
        let validation_errors = validate_merged_rule_set(&merged);
        self.leak_detector.apply_leak_detection(&mut merged, metadata);

        ResolvedRuleSet {
            vertical,
            market,
            merged,
            validation_errors,
        }
    }

    /// Patterns for the resolved scope; fallback sets are topped up with rule set patterns
    pub async fn load_patterns(&self, resolved: &ResolvedRuleSet, scope: PatternScope) -> Arc<IntentPatternSet> {
        let scope = PatternScope {
            vertical: Some(resolved.vertical.vertical_id.to_string()),
            market: Some(resolved.market.market_id.to_string()),
            ..scope
        };
        let loaded = self.patterns.load_intent_patterns(&scope).await;
        if !loaded.fallback_mode {
            return loaded;
        }

        let known: HashSet<String> = loaded.configs().map(|c| c.pattern.to_lowercase()).collect();
        let extra: Vec<_> = resolved
            .merged
            .intent_patterns()
            .into_iter()
            .filter(|p| !known.contains(&p.pattern.to_lowercase()))
            .collect();
        if extra.is_empty() {
            return loaded;
        }
        debug!("Topping up fallback patterns with {} rule set patterns", extra.len());

        let mut combined = (*loaded).clone();
        let extra = PatternCompiler::compile(extra, true);
        combined.patterns.extend(extra.patterns);
        combined.rejected.extend(extra.rejected);
        Arc::new(combined)
    }

    /// Full analysis of one app's metadata
    pub async fn audit(&self, metadata: &AppMetadata, client: Option<&RuleSet>) -> AuditReport {
        self.audit_scoped(metadata, client, PatternScope::default()).await
    }

    /// `audit` with organization/app pattern scope
    pub async fn audit_scoped(
        &self,
        metadata: &AppMetadata,
        client: Option<&RuleSet>,
        scope: PatternScope,
    ) -> AuditReport {
        let resolved = self.resolve_rule_set(metadata, client);
        let patterns = self.load_patterns(&resolved, scope).await;
        let merged = &resolved.merged;

        let title_tokens = tokenize(&metadata.title);
        let subtitle_tokens = tokenize(&metadata.subtitle);
        let search_intent = compute_combined_search_intent_coverage(&title_tokens, &subtitle_tokens, &patterns);

        let combo_options = ComboAnalysisOptions {
            combos: ComboOptions::default()
                .with_limits(self.config.combos)
                .with_stopwords(&merged.rule_set.stopword_overrides),
            brand_override: None,
            filter_brand: true,
        };
        let combos = analyze_all_combos(&metadata.title, &metadata.subtitle, &combo_options);
        let combo_texts: Vec<&str> = combos.existing_combos.iter().map(|c| c.text.as_str()).collect();
        let combo_intent = compute_intent_coverage(&combo_texts, &patterns, &self.config.classification);

        let hooks = get_hook_classification_summary(&[metadata.title.as_str(), metadata.subtitle.as_str()], Some(merged));
        let leaks = get_leak_detection_summary(&merged.leak_warnings);

        debug!(
            "Audit [{}] vertical={} market={} combos={} leaks={} fallback={}",
            metadata.title,
            resolved.vertical.vertical_id,
            resolved.market.market_id,
            combos.stats.total,
            leaks.total,
            patterns.fallback_mode
        );

        AuditReport {
            search_intent,
            combo_intent,
            hooks,
            combos,
            leaks,
            fallback_mode: patterns.fallback_mode,
            resolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::rule::{NoRemoteSource, RuleSetSource, Severity};

    fn engine() -> RuleEngine {
        RuleEngine::with_parts(ConfigManager::get_default(), RuleSetStore::builtin(), Arc::new(NoRemoteSource))
    }

    #[test]
    fn test_resolve_language_learning_app() {
        let metadata = AppMetadata::new("Lingo: Learn Spanish", "Language lessons")
            .with_category("Education")
            .with_locale("es_MX");
        let resolved = engine().resolve_rule_set(&metadata, None);

        assert_eq!(resolved.vertical.vertical_id, "language_learning");
        assert_eq!(resolved.market.market_id, "mx");
        assert!(resolved.validation_errors.is_empty());
        let chain = &resolved.merged.inheritance_chain;
        assert_eq!(chain.vertical.as_ref().map(|r| r.id.as_str()), Some("vertical_language_learning"));
        assert_eq!(chain.market.as_ref().map(|r| r.id.as_str()), Some("market_mx"));
        assert!(resolved.merged.rule_set.stopword_overrides.contains(&"para".to_string()));
        assert!(resolved.merged.leak_warnings.is_empty());
    }

    #[test]
    fn test_client_layer_wins() {
        let mut client = RuleSet::new("client_acme", RuleSetSource::Client);
        client.character_limits.title = Some(25);
        let metadata = AppMetadata::new("Budget Planner", "").with_category("Finance");
        let resolved = engine().resolve_rule_set(&metadata, Some(&client));

        assert_eq!(resolved.merged.rule_set.character_limits.title, Some(25));
        assert_eq!(resolved.merged.rule_set.character_limits.subtitle, Some(30));
        assert!(resolved.merged.inheritance_chain.client.is_some());
    }

    #[tokio::test]
    async fn test_audit_carries_fallback_flag() {
        let metadata = AppMetadata::new("Lingo: Learn Spanish Fast", "Free language lessons")
            .with_category("Education")
            .with_locale("en-US");
        let report = engine().audit(&metadata, None).await;

        assert!(report.fallback_mode);
        assert!(report.search_intent.fallback_mode);
        assert!(report.combo_intent.fallback_mode);
        assert!(report.search_intent.title.score > 0.0);
        assert!(report.combos.stats.total > 0);
        assert!(report.combos.existing_combos.iter().any(|c| c.text == "learn spanish"));
        assert_eq!(report.hooks.distribution.total, 2);
        assert!(report.leaks.highest_severity.map_or(true, |s| s < Severity::High));
    }

    #[tokio::test]
    async fn test_fallback_topped_up_with_vertical_patterns() {
        let engine = engine();
        let metadata = AppMetadata::new("Lingo: Learn Spanish", "Language lessons").with_category("Education");
        let resolved = engine.resolve_rule_set(&metadata, None);
        let patterns = engine.load_patterns(&resolved, PatternScope::default()).await;

        assert!(patterns.fallback_mode);
        assert!(patterns.configs().any(|c| c.pattern == "learn spanish"));
        // Base intent book duplicates the fallback table and is not added twice
        assert_eq!(patterns.configs().filter(|c| c.pattern == "learn").count(), 1);
    }
}
