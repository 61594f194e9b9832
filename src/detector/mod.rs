//! Detection module: vertical/market signatures, intent and hook classification, leak checks
pub mod signature;
pub mod intent;
pub mod hook;
pub mod leak;

// Core exports
pub use self::signature::{detect_market, detect_vertical, MarketDetection, VerticalDetection};
pub use self::intent::{
    classify_combo_intent, classify_token_intent, compute_combined_search_intent_coverage,
    compute_intent_coverage, compute_search_intent_coverage, CombinedSearchIntentCoverage,
    ComboIntentClassification, IntentCoverage, IntentMatch, SearchIntentCoverage,
    TokenIntentClassification,
};
pub use self::hook::{
    calculate_hook_diversity_score, classify_hook, classify_hook_distribution,
    get_hook_classification_summary, resolve_hook_patterns, HookClassificationSummary,
    HookDistribution,
};
pub use self::leak::{
    apply_leak_detection, detect_kpi_anomaly, detect_named_vertical_leaks, detect_vertical_leak,
    detect_vertical_mismatch, get_leak_detection_summary, LeakDetectionSummary, LeakDetector,
    VerticalSignature,
};
