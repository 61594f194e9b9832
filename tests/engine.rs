//! End-to-end engine behaviour with in-memory pattern sources

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use aso_bible::rule::IntentPatternRow;
use aso_bible::{
    AppMetadata, AsoError, AsoResult, ConfigManager, DominantIntent, LeakWarningType, PatternScope,
    PatternSource, RuleEngine, RuleSet, RuleSetSource, RuleSetStore,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Remote that can be switched off mid-test
struct SwitchableSource {
    online: AtomicBool,
}

#[async_trait]
impl PatternSource for SwitchableSource {
    async fn fetch_intent_patterns(&self, _scope: &PatternScope) -> AsoResult<Vec<IntentPatternRow>> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(AsoError::RuleLoadError("connection refused".to_string()));
        }
        let mut cheapest = IntentPatternRow::new("cheapest", "commercial");
        cheapest.effective_weight = Some(2.0);
        let mut broken = IntentPatternRow::new("(broken", "informational");
        broken.is_regex = true;
        Ok(vec![cheapest, IntentPatternRow::new("learn", "informational"), broken])
    }
}

fn metadata() -> AppMetadata {
    AppMetadata::new("Lingo: Learn Spanish Fast", "Cheapest language lessons")
        .with_category("Education")
        .with_locale("en_US")
}

#[tokio::test]
async fn audit_uses_remote_patterns_then_degrades() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigManager::custom()
        .snapshot_path(dir.path().join("patterns.mp"))
        .build();
    let source = Arc::new(SwitchableSource { online: AtomicBool::new(true) });
    let engine = RuleEngine::with_parts(config, RuleSetStore::builtin(), source.clone());

    let online = engine.audit(&metadata(), None).await;
    assert!(!online.fallback_mode);
    assert_eq!(online.resolved.vertical.vertical_id, "language_learning");
    assert_eq!(online.resolved.market.market_id, "us");
    let cheapest = online
        .search_intent
        .subtitle
        .tokens
        .iter()
        .find(|t| t.token == "cheapest")
        .unwrap();
    assert_eq!(cheapest.dominant_intent, DominantIntent::Commercial);

    // Remote down: cached set first, then the snapshot after invalidation
    source.online.store(false, Ordering::SeqCst);
    assert!(!engine.audit(&metadata(), None).await.fallback_mode);
    engine.clear_intent_pattern_cache();
    let from_snapshot = engine.audit(&metadata(), None).await;
    assert!(!from_snapshot.fallback_mode);

    // No snapshot configured: hardcoded fallback
    let bare = RuleEngine::with_parts(ConfigManager::get_default(), RuleSetStore::builtin(), source);
    let degraded = bare.audit(&metadata(), None).await;
    assert!(degraded.fallback_mode);
    assert!(degraded.search_intent.fallback_mode);
    assert!(degraded.combo_intent.fallback_mode);
}

#[tokio::test]
async fn misassigned_client_layer_is_flagged() {
    init_tracing();
    let engine = RuleEngine::new(ConfigManager::get_default()).unwrap();

    // Rewards copy pushed into a finance app by a client layer
    let client: RuleSet = serde_json::from_str(
        r#"{
            "id": "client_acme",
            "source": "client",
            "version": 3,
            "recommendationOverrides": {
                "subtitle_hint": { "message": "Say 'Earn cash back' in the subtitle" }
            }
        }"#,
    )
    .unwrap();
    assert_eq!(client.source, RuleSetSource::Client);

    let finance_app = AppMetadata::new("Budgeteer - Budget Planner", "Track expenses").with_category("Finance");
    let report = engine.audit(&finance_app, Some(&client)).await;

    assert_eq!(report.resolved.vertical.vertical_id, "finance");
    assert_eq!(report.resolved.merged.rule_set.version, 3);
    assert!(report
        .resolved
        .merged
        .leak_warnings
        .iter()
        .any(|w| w.kind == LeakWarningType::RecommendationLeak));
    assert_eq!(report.leaks.by_type[&LeakWarningType::RecommendationLeak], 1);
    assert_eq!(report.combos.brand.as_deref(), Some("budgeteer"));
    assert!(report
        .combos
        .missing_combos
        .iter()
        .all(|c| !c.keywords.contains(&"budgeteer".to_string())));
}
