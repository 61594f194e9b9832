//! aso-bible - layered ASO rule engine: rule set merging, intent/hook classification,
//! vertical leak detection and keyword combination analysis

// Error types
pub use self::error::{AsoError, AsoResult};

// Configuration
pub use self::config::{
    ClassificationThresholds, ComboLimits, ConfigManager, CustomConfigBuilder, GlobalConfig,
    LeakThresholds, RemoteOptions,
};

// Profile registry
pub use self::profile::{
    get_market_profile, get_vertical_profile, map_category_to_vertical, normalize_locale,
    MarketProfile, VerticalProfile,
};

// Rule sets, merge engine and pattern loading
pub use self::rule::{
    get_merged_rule_set_summary, merge_rule_sets, validate_merged_rule_set, AppMetadata,
    DominantIntent, HookCategory, IntentPatternConfig, IntentPatternService, IntentType,
    LeakWarning, LeakWarningType, MergedRuleSet, PatternScope, PatternSource, RemotePatternSource,
    RuleSet, RuleSetSource, RuleSetStore, Severity,
};

// Pattern compiler
pub use self::compiler::{IntentPatternSet, PatternCompiler};

// Detection and classification
pub use self::detector::{
    apply_leak_detection, calculate_hook_diversity_score, classify_combo_intent, classify_hook,
    classify_hook_distribution, classify_token_intent, compute_combined_search_intent_coverage,
    compute_intent_coverage, compute_search_intent_coverage, detect_market, detect_vertical,
    detect_vertical_leak, detect_vertical_mismatch, get_hook_classification_summary,
    get_leak_detection_summary, LeakDetector,
};

// Combination generator
pub use self::combo::{
    analyze_all_combos, filter_combos_by_keyword, generate_all_possible_combos,
    group_combos_by_length, ComboAnalysisOptions, ComboOptions, GeneratedCombo,
};

// Facade
pub use self::engine::{AuditReport, ResolvedRuleSet, RuleEngine};

// Submodules
pub mod config;
pub mod error;
pub mod profile;
pub mod rule;
pub mod compiler;
pub mod detector;
pub mod combo;
pub mod utils;
pub mod engine;
