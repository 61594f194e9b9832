//! Rule data model
//! Pure data: rule sets, override maps, pattern configs, diagnostics. No business logic.

use std::collections::BTreeMap;
use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ======== Intent & hook vocabularies ========

/// Search intent behind a keyword or phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Informational,
    Commercial,
    Transactional,
    Navigational,
}

impl IntentType {
    pub const ALL: [IntentType; 4] = [
        IntentType::Informational,
        IntentType::Commercial,
        IntentType::Transactional,
        IntentType::Navigational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::Informational => "informational",
            IntentType::Commercial => "commercial",
            IntentType::Transactional => "transactional",
            IntentType::Navigational => "navigational",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "informational" => Some(IntentType::Informational),
            "commercial" => Some(IntentType::Commercial),
            "transactional" => Some(IntentType::Transactional),
            "navigational" => Some(IntentType::Navigational),
            _ => None,
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome: one intent, several (mixed), or nothing matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantIntent {
    Informational,
    Commercial,
    Transactional,
    Navigational,
    Mixed,
    Unknown,
}

impl DominantIntent {
    pub fn intent_type(&self) -> Option<IntentType> {
        match self {
            DominantIntent::Informational => Some(IntentType::Informational),
            DominantIntent::Commercial => Some(IntentType::Commercial),
            DominantIntent::Transactional => Some(IntentType::Transactional),
            DominantIntent::Navigational => Some(IntentType::Navigational),
            DominantIntent::Mixed | DominantIntent::Unknown => None,
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, DominantIntent::Unknown)
    }
}

impl From<IntentType> for DominantIntent {
    fn from(intent: IntentType) -> Self {
        match intent {
            IntentType::Informational => DominantIntent::Informational,
            IntentType::Commercial => DominantIntent::Commercial,
            IntentType::Transactional => DominantIntent::Transactional,
            IntentType::Navigational => DominantIntent::Navigational,
        }
    }
}

/// Psychological hook categories found in marketing copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookCategory {
    LearningEducational,
    OutcomeBenefit,
    StatusAuthority,
    EaseOfUse,
    TimeToResult,
    TrustSafety,
}

impl HookCategory {
    /// Evaluation order of the hook classifier; the first match wins
    pub const PRIORITY_ORDER: [HookCategory; 6] = [
        HookCategory::TimeToResult,
        HookCategory::TrustSafety,
        HookCategory::StatusAuthority,
        HookCategory::OutcomeBenefit,
        HookCategory::EaseOfUse,
        HookCategory::LearningEducational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookCategory::LearningEducational => "learning_educational",
            HookCategory::OutcomeBenefit => "outcome_benefit",
            HookCategory::StatusAuthority => "status_authority",
            HookCategory::EaseOfUse => "ease_of_use",
            HookCategory::TimeToResult => "time_to_result",
            HookCategory::TrustSafety => "trust_safety",
        }
    }
}

impl fmt::Display for HookCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hook category -> literal trigger strings
pub type HookPatternMap = BTreeMap<HookCategory, Vec<String>>;

// ======== Intent patterns ========

/// One intent pattern; a leaf fact never mutated by classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPatternConfig {
    pub pattern: String,
    pub intent_type: IntentType,
    /// 0.1 - 3.0
    pub weight: f64,
    /// 0 - 200
    pub priority: u32,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub word_boundary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

fn default_true() -> bool {
    true
}

impl IntentPatternConfig {
    /// Word-boundary literal pattern
    pub fn literal(pattern: impl Into<String>, intent_type: IntentType, weight: f64, priority: u32) -> Self {
        Self {
            pattern: pattern.into(),
            intent_type,
            weight,
            priority,
            is_regex: false,
            case_sensitive: false,
            word_boundary: true,
            example: None,
        }
    }

    /// Case-insensitive regex pattern
    pub fn regex(pattern: impl Into<String>, intent_type: IntentType, weight: f64, priority: u32) -> Self {
        Self {
            is_regex: true,
            word_boundary: false,
            ..Self::literal(pattern, intent_type, weight, priority)
        }
    }
}

// ======== Rule set overrides ========

/// Layer a rule set belongs to, ordered by precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSetSource {
    Base,
    Vertical,
    Market,
    Client,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipliers: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_type: Option<IntentType>,
    /// Literal trigger phrases; a later layer's list replaces an earlier one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<u32>,
}

pub type KpiOverrides = BTreeMap<String, KpiOverride>;
pub type FormulaOverrides = BTreeMap<String, FormulaOverride>;
pub type IntentOverrides = BTreeMap<String, IntentOverride>;
pub type HookOverrides = BTreeMap<HookCategory, HookOverride>;
/// Token -> relevance (0 = noise ... 3 = core)
pub type TokenRelevanceOverrides = BTreeMap<String, u8>;
pub type RecommendationOverrides = BTreeMap<String, RecommendationOverride>;

/// A bundle of overrides attributable to one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub source: RuleSetSource,
    #[serde(default)]
    pub version: u32,
    /// Vertical this rule set is assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default)]
    pub kpi_overrides: KpiOverrides,
    #[serde(default)]
    pub formula_overrides: FormulaOverrides,
    #[serde(default)]
    pub intent_overrides: IntentOverrides,
    #[serde(default)]
    pub hook_overrides: HookOverrides,
    #[serde(default)]
    pub token_relevance_overrides: TokenRelevanceOverrides,
    #[serde(default)]
    pub stopword_overrides: Vec<String>,
    #[serde(default)]
    pub recommendation_overrides: RecommendationOverrides,
    #[serde(default)]
    pub character_limits: CharacterLimits,
}

impl RuleSet {
    /// Empty rule set for a layer
    pub fn new(id: impl Into<String>, source: RuleSetSource) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            source,
            version: 1,
            vertical: None,
            market: None,
            kpi_overrides: KpiOverrides::new(),
            formula_overrides: FormulaOverrides::new(),
            intent_overrides: IntentOverrides::new(),
            hook_overrides: HookOverrides::new(),
            token_relevance_overrides: TokenRelevanceOverrides::new(),
            stopword_overrides: Vec::new(),
            recommendation_overrides: RecommendationOverrides::new(),
            character_limits: CharacterLimits::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_vertical(mut self, vertical: impl Into<String>) -> Self {
        self.vertical = Some(vertical.into());
        self
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    /// Lightweight back-reference for inheritance chains
    pub fn to_ref(&self) -> RuleSetRef {
        RuleSetRef {
            id: self.id.clone(),
            label: self.label.clone(),
            version: self.version,
        }
    }
}

// ======== Merged rule set ========

/// Audit reference to a contributing layer (not owned)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetRef {
    pub id: String,
    pub label: String,
    pub version: u32,
}

/// Which layer contributed to a merged rule set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceChain {
    pub base: Option<RuleSetRef>,
    pub vertical: Option<RuleSetRef>,
    pub market: Option<RuleSetRef>,
    pub client: Option<RuleSetRef>,
}

impl InheritanceChain {
    pub fn slot_mut(&mut self, source: RuleSetSource) -> &mut Option<RuleSetRef> {
        match source {
            RuleSetSource::Base => &mut self.base,
            RuleSetSource::Vertical => &mut self.vertical,
            RuleSetSource::Market => &mut self.market,
            RuleSetSource::Client => &mut self.client,
        }
    }

    /// Present layers, lowest precedence first
    pub fn layers(&self) -> Vec<(RuleSetSource, &RuleSetRef)> {
        [
            (RuleSetSource::Base, &self.base),
            (RuleSetSource::Vertical, &self.vertical),
            (RuleSetSource::Market, &self.market),
            (RuleSetSource::Client, &self.client),
        ]
        .into_iter()
        .filter_map(|(source, slot)| slot.as_ref().map(|r| (source, r)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.layers().is_empty()
    }
}

/// Effective configuration produced by the merge engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRuleSet {
    #[serde(flatten)]
    pub rule_set: RuleSet,
    pub inheritance_chain: InheritanceChain,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub leak_warnings: Vec<LeakWarning>,
}

impl MergedRuleSet {
    /// Assigned vertical, `base` when unassigned
    pub fn vertical_id(&self) -> &str {
        self.rule_set.vertical.as_deref().unwrap_or("base")
    }

    /// Intent overrides as a pattern book, in key order
    pub fn intent_patterns(&self) -> Vec<IntentPatternConfig> {
        let mut patterns = Vec::new();
        for (key, ov) in &self.rule_set.intent_overrides {
            // Keys named after an intent type imply it
            let intent_type = ov.intent_type.or_else(|| IntentType::parse(key));
            let (Some(intent_type), Some(list)) = (intent_type, ov.patterns.as_ref()) else {
                continue;
            };
            for p in list {
                patterns.push(IntentPatternConfig::literal(
                    p.clone(),
                    intent_type,
                    ov.weight.unwrap_or(1.0),
                    ov.priority.unwrap_or(100),
                ));
            }
        }
        patterns
    }

    /// Hook triggers overridden by the merged layers
    pub fn hook_patterns(&self) -> HookPatternMap {
        self.rule_set
            .hook_overrides
            .iter()
            .filter_map(|(cat, ov)| ov.patterns.as_ref().map(|p| (*cat, p.clone())))
            .filter(|(_, p)| !p.is_empty())
            .collect()
    }
}

// ======== Diagnostics ========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakWarningType {
    VerticalMismatch,
    PatternLeak,
    RecommendationLeak,
    KpiAnomaly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Diagnostic attached to a merged rule set; never blocks a merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakWarning {
    #[serde(rename = "type")]
    pub kind: LeakWarningType,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

// ======== App metadata ========

/// The slice of App Store metadata the engine looks at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: Option<String>,
    /// App Store primary category, e.g. "Education"
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

impl AppMetadata {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}
