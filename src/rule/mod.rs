//! Rule module: rule set model, canonical defaults, merge engine, store and pattern loading
pub mod model;
pub mod defaults;
pub mod merge;
pub mod store;
pub mod cache;
pub mod snapshot;
pub mod loader;

// Core exports
pub use self::model::{
    AppMetadata, CharacterLimits, DominantIntent, FormulaOverride, HookCategory, HookOverride,
    HookPatternMap, InheritanceChain, IntentOverride, IntentPatternConfig, IntentType, KpiOverride,
    LeakWarning, LeakWarningType, MergedRuleSet, RecommendationOverride, RuleSet, RuleSetRef,
    RuleSetSource, Severity,
};
pub use self::defaults::{fallback_intent_patterns, DEFAULT_STOPWORDS, GENERIC_HOOK_PATTERNS};
pub use self::merge::{
    get_merged_rule_set_summary, merge_rule_sets, validate_merged_rule_set, Merge,
    MergedRuleSetSummary, RuleSetVersionRecord,
};
pub use self::store::{RuleSetStore, BUILTIN_STORE};
pub use self::cache::PatternCache;
pub use self::snapshot::PatternSnapshotStore;
pub use self::loader::{
    IntentPatternRow, IntentPatternService, NoRemoteSource, PatternScope, PatternSource,
    RemotePatternSource,
};
