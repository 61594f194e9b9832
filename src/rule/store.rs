//! Rule set store
//! Holds the canonical base/vertical/market rule sets plus any client layers.
//! Loaded once and treated as immutable afterwards.

use std::collections::{BTreeMap, HashMap};
use once_cell::sync::Lazy;
use tracing::debug;

use super::defaults::{fallback_intent_patterns, DEFAULT_STOPWORDS};
use super::merge::merge_rule_sets;
use super::model::{
    CharacterLimits, FormulaOverride, HookCategory, HookOverride, IntentOverride, IntentType,
    KpiOverride, MergedRuleSet, RecommendationOverride, RuleSet, RuleSetSource,
};
use crate::error::{AsoError, AsoResult};
use crate::profile::BASE_VERTICAL_ID;

/// Built-in store, shared read-only
pub static BUILTIN_STORE: Lazy<RuleSetStore> = Lazy::new(RuleSetStore::builtin);

#[derive(Debug, Clone)]
pub struct RuleSetStore {
    base: RuleSet,
    verticals: BTreeMap<String, RuleSet>,
    markets: BTreeMap<String, RuleSet>,
    clients: HashMap<String, RuleSet>,
}

impl RuleSetStore {
    /// Store with only a base layer
    pub fn with_base(base: RuleSet) -> Self {
        Self {
            base,
            verticals: BTreeMap::new(),
            markets: BTreeMap::new(),
            clients: HashMap::new(),
        }
    }

    /// Canonical rule sets shipped with the engine
    pub fn builtin() -> Self {
        let mut store = Self::with_base(builtin_base());
        for rs in builtin_verticals() {
            store.insert(rs);
        }
        for rs in builtin_markets() {
            store.insert(rs);
        }
        debug!(
            "Built-in rule set store ready: {} verticals, {} markets",
            store.verticals.len(),
            store.markets.len()
        );
        store
    }

    /// Add or replace a rule set in the slot its `source` names
    pub fn insert(&mut self, rule_set: RuleSet) {
        match rule_set.source {
            RuleSetSource::Base => self.base = rule_set,
            RuleSetSource::Vertical => {
                let key = rule_set.vertical.clone().unwrap_or_else(|| rule_set.id.clone());
                self.verticals.insert(key, rule_set);
            }
            RuleSetSource::Market => {
                let key = rule_set.market.clone().unwrap_or_else(|| rule_set.id.clone());
                self.markets.insert(key, rule_set);
            }
            RuleSetSource::Client => {
                self.clients.insert(rule_set.id.clone(), rule_set);
            }
        }
    }

    /// Parse one rule set row (camelCase JSON) and insert it
    pub fn insert_json(&mut self, json: &str) -> AsoResult<()> {
        let rule_set: RuleSet = serde_json::from_str(json)?;
        if rule_set.id.trim().is_empty() {
            return Err(AsoError::RuleParseError("Rule set id must not be empty".to_string()));
        }
        self.insert(rule_set);
        Ok(())
    }

    pub fn base(&self) -> &RuleSet {
        &self.base
    }

    pub fn vertical(&self, vertical_id: &str) -> Option<&RuleSet> {
        self.verticals.get(vertical_id)
    }

    pub fn market(&self, market_id: &str) -> Option<&RuleSet> {
        self.markets.get(market_id)
    }

    pub fn client(&self, client_id: &str) -> Option<&RuleSet> {
        self.clients.get(client_id)
    }

    /// Vertical rule sets keyed by vertical id
    pub fn verticals(&self) -> impl Iterator<Item = (&str, &RuleSet)> {
        self.verticals.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge base -> vertical -> market -> client; absent layers are skipped
    pub fn merge_for(&self, vertical_id: &str, market_id: &str, client: Option<&RuleSet>) -> MergedRuleSet {
        let mut layers: Vec<&RuleSet> = vec![&self.base];
        if vertical_id != BASE_VERTICAL_ID {
            if let Some(v) = self.vertical(vertical_id) {
                layers.push(v);
            }
        }
        if let Some(m) = self.market(market_id) {
            layers.push(m);
        }
        if let Some(c) = client {
            layers.push(c);
        }
        merge_rule_sets(&layers)
    }
}

// ======== Built-in data ========

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn intent(intent_type: IntentType, patterns: &[&str], weight: f64, priority: u32) -> IntentOverride {
    IntentOverride {
        intent_type: Some(intent_type),
        patterns: Some(strings(patterns)),
        weight: Some(weight),
        priority: Some(priority),
    }
}

fn hook(patterns: &[&str]) -> HookOverride {
    HookOverride { patterns: Some(strings(patterns)), weight: None }
}

fn recommendation(message: &str, priority: u32) -> RecommendationOverride {
    RecommendationOverride {
        message: Some(message.to_string()),
        priority: Some(priority),
        enabled: Some(true),
    }
}

fn tokens(pairs: &[(&str, u8)]) -> BTreeMap<String, u8> {
    pairs.iter().map(|(t, r)| (t.to_string(), *r)).collect()
}

fn builtin_base() -> RuleSet {
    let mut rs = RuleSet::new("base", RuleSetSource::Base).with_label("ASO Bible Base");
    rs.vertical = Some(BASE_VERTICAL_ID.to_string());

    for (kpi, weight) in [
        ("keyword_coverage", 0.25),
        ("search_intent_coverage", 0.2),
        ("combo_coverage", 0.2),
        ("hook_diversity", 0.15),
        ("readability", 0.2),
    ] {
        rs.kpi_overrides.insert(kpi.to_string(), KpiOverride { weight: Some(weight), enabled: Some(true) });
    }

    rs.formula_overrides.insert(
        "keyword_relevance".to_string(),
        FormulaOverride {
            multipliers: Some(BTreeMap::from([("title".to_string(), 1.0), ("subtitle".to_string(), 0.8)])),
            thresholds: Some(BTreeMap::from([("min_score".to_string(), 40.0)])),
        },
    );

    // Base intent book mirrors the fallback set
    for p in fallback_intent_patterns() {
        let entry = rs
            .intent_overrides
            .entry(p.intent_type.as_str().to_string())
            .or_insert_with(|| IntentOverride {
                intent_type: Some(p.intent_type),
                patterns: Some(Vec::new()),
                weight: Some(1.0),
                priority: Some(100),
            });
        if let Some(list) = entry.patterns.as_mut() {
            list.push(p.pattern.clone());
        }
    }

    rs.stopword_overrides = strings(DEFAULT_STOPWORDS);
    rs.recommendation_overrides.insert(
        "title_primary_keyword".to_string(),
        recommendation("Place your primary keyword early in the title.", 100),
    );
    rs.recommendation_overrides.insert(
        "subtitle_benefit".to_string(),
        recommendation("Use the subtitle to state the main benefit in plain words.", 80),
    );
    rs.character_limits = CharacterLimits {
        title: Some(30),
        subtitle: Some(30),
        keywords: Some(100),
        description: Some(4000),
    };
    rs
}

struct VerticalSeed {
    id: &'static str,
    label: &'static str,
    intents: &'static [(&'static str, IntentType, &'static [&'static str])],
    tokens: &'static [(&'static str, u8)],
    hooks: &'static [(HookCategory, &'static [&'static str])],
    recommendations: &'static [(&'static str, &'static str)],
}

static VERTICAL_SEEDS: &[VerticalSeed] = &[
    VerticalSeed {
        id: "language_learning",
        label: "Language Learning",
        intents: &[
            ("learning_goal", IntentType::Informational, &["learn a language", "learn spanish", "learn english"]),
            ("language_practice", IntentType::Informational, &["practice speaking", "conversation practice"]),
            ("lesson_format", IntentType::Commercial, &["bite-sized lessons", "daily lessons"]),
            ("fluency_outcome", IntentType::Commercial, &["become fluent", "speak fluently"]),
            ("learning_method", IntentType::Informational, &["spaced repetition", "immersion"]),
        ],
        tokens: &[
            ("learn", 3), ("language", 3), ("lesson", 3), ("fluent", 3), ("vocabulary", 2),
            ("grammar", 2), ("speak", 2), ("pronunciation", 2), ("spanish", 2), ("french", 2),
        ],
        hooks: &[
            (HookCategory::LearningEducational, &["learn", "lesson", "practice", "course"]),
            (HookCategory::OutcomeBenefit, &["fluent", "speak confidently", "hold a conversation"]),
            (HookCategory::TimeToResult, &["minutes a day", "in 3 months"]),
        ],
        recommendations: &[(
            "title_language_hint",
            "Name the language you teach, for example 'Learn Spanish', in the title.",
        )],
    },
    VerticalSeed {
        id: "rewards",
        label: "Rewards & Cashback",
        intents: &[
            ("reward_earning", IntentType::Transactional, &["earn rewards", "earn points"]),
            ("cashback_offer", IntentType::Transactional, &["cash back", "cashback"]),
            ("reward_redemption", IntentType::Transactional, &["redeem gift cards", "redeem points"]),
            ("points_program", IntentType::Commercial, &["loyalty points", "points program"]),
            ("deal_hunting", IntentType::Commercial, &["best deals", "daily deals"]),
        ],
        tokens: &[
            ("rewards", 3), ("cashback", 3), ("earn", 3), ("points", 2), ("gift", 2),
            ("coupons", 2), ("redeem", 2), ("deals", 2), ("survey", 2), ("bonus", 2),
        ],
        hooks: &[
            (HookCategory::OutcomeBenefit, &["earn", "cash back", "free gift cards"]),
            (HookCategory::EaseOfUse, &["just shop", "automatic"]),
        ],
        recommendations: &[(
            "subtitle_reward_hint",
            "Mention how users earn rewards, for example 'Earn cash back on every purchase'.",
        )],
    },
    VerticalSeed {
        id: "finance",
        label: "Finance",
        intents: &[
            ("budget_planning", IntentType::Informational, &["budget planner", "monthly budget"]),
            ("investing_research", IntentType::Commercial, &["invest in stocks", "stock market"]),
            ("banking_access", IntentType::Navigational, &["mobile banking", "bank account"]),
            ("savings_goal", IntentType::Informational, &["save money", "savings goal"]),
            ("expense_tracking", IntentType::Transactional, &["track expenses", "expense tracker"]),
        ],
        tokens: &[
            ("budget", 3), ("invest", 3), ("stocks", 3), ("banking", 2), ("savings", 2),
            ("expense", 2), ("portfolio", 2), ("credit", 2), ("loan", 2), ("crypto", 2),
        ],
        hooks: &[
            (HookCategory::TrustSafety, &["bank-level security", "fdic insured", "secure"]),
            (HookCategory::OutcomeBenefit, &["save money", "grow your wealth"]),
        ],
        recommendations: &[(
            "title_finance_hint",
            "Lead with the money outcome, for example 'Track your spending' or 'Budget planner'.",
        )],
    },
    VerticalSeed {
        id: "dating",
        label: "Dating",
        intents: &[
            ("dating_discovery", IntentType::Navigational, &["meet singles", "dating app"]),
            ("relationship_goal", IntentType::Informational, &["serious relationship", "find love"]),
            ("match_making", IntentType::Commercial, &["best matches", "compatibility"]),
        ],
        tokens: &[
            ("dating", 3), ("singles", 3), ("match", 2), ("relationship", 2), ("flirt", 2),
            ("romance", 2), ("meet", 2), ("chat", 2),
        ],
        hooks: &[(HookCategory::TrustSafety, &["verified profiles", "safe dating"])],
        recommendations: &[],
    },
    VerticalSeed {
        id: "productivity",
        label: "Productivity",
        intents: &[
            ("task_management", IntentType::Transactional, &["to-do list", "task manager"]),
            ("planning_workflow", IntentType::Informational, &["daily planner", "plan your day"]),
            ("note_capture", IntentType::Transactional, &["take notes", "note taking"]),
        ],
        tokens: &[
            ("tasks", 3), ("todo", 3), ("planner", 2), ("notes", 2), ("calendar", 2),
            ("reminders", 2), ("organize", 2), ("focus", 2),
        ],
        hooks: &[(HookCategory::EaseOfUse, &["simple", "one tap", "drag and drop"])],
        recommendations: &[],
    },
    VerticalSeed {
        id: "health",
        label: "Health & Fitness",
        intents: &[
            ("workout_plan", IntentType::Informational, &["home workout", "workout plan"]),
            ("mindfulness_practice", IntentType::Informational, &["guided meditation", "sleep sounds"]),
            ("nutrition_tracking", IntentType::Transactional, &["calorie counter", "meal plan"]),
        ],
        tokens: &[
            ("workout", 3), ("fitness", 3), ("meditation", 3), ("sleep", 2), ("calories", 2),
            ("yoga", 2), ("diet", 2), ("steps", 2),
        ],
        hooks: &[(HookCategory::TimeToResult, &["7-minute", "30 days", "minutes a day"])],
        recommendations: &[],
    },
    VerticalSeed {
        id: "entertainment",
        label: "Entertainment",
        intents: &[
            ("content_streaming", IntentType::Transactional, &["watch movies", "stream music"]),
            ("content_discovery", IntentType::Commercial, &["new releases", "top charts"]),
            ("playlist_curation", IntentType::Informational, &["curated playlists", "for you"]),
        ],
        tokens: &[
            ("movies", 3), ("music", 3), ("streaming", 3), ("shows", 2), ("podcasts", 2),
            ("playlist", 2), ("series", 2), ("watch", 2),
        ],
        hooks: &[(HookCategory::StatusAuthority, &["award-winning", "exclusive"])],
        recommendations: &[],
    },
    VerticalSeed {
        id: "education",
        label: "Education",
        intents: &[
            ("homework_help", IntentType::Informational, &["homework help", "step-by-step solutions"]),
            ("exam_prep", IntentType::Commercial, &["exam prep", "practice tests"]),
            ("study_tools", IntentType::Transactional, &["flashcards", "study planner"]),
        ],
        tokens: &[
            ("study", 3), ("homework", 3), ("math", 3), ("exam", 2), ("flashcards", 2),
            ("tutor", 2), ("course", 2), ("quiz", 2),
        ],
        hooks: &[(HookCategory::OutcomeBenefit, &["better grades", "ace your exams"])],
        recommendations: &[],
    },
];

fn builtin_verticals() -> Vec<RuleSet> {
    VERTICAL_SEEDS
        .iter()
        .map(|seed| {
            let mut rs = RuleSet::new(format!("vertical_{}", seed.id), RuleSetSource::Vertical)
                .with_label(seed.label)
                .with_vertical(seed.id);
            for (key, intent_type, patterns) in seed.intents {
                rs.intent_overrides.insert(key.to_string(), intent(*intent_type, patterns, 1.5, 150));
            }
            rs.token_relevance_overrides = tokens(seed.tokens);
            for (cat, patterns) in seed.hooks {
                rs.hook_overrides.insert(*cat, hook(patterns));
            }
            for (key, message) in seed.recommendations {
                rs.recommendation_overrides.insert(key.to_string(), recommendation(message, 120));
            }
            rs
        })
        .collect()
}

/// (market id, stopwords, title limit)
static MARKET_SEEDS: &[(&str, &[&str], u32)] = &[
    ("us", &[], 30),
    ("gb", &[], 30),
    ("ca", &["le", "la", "les", "et"], 30),
    ("au", &[], 30),
    ("de", &["der", "die", "das", "und", "für", "mit", "ein", "eine"], 30),
    ("fr", &["le", "la", "les", "et", "pour", "avec", "un", "une"], 30),
    ("es", &["el", "la", "los", "las", "y", "para", "con", "un", "una"], 30),
    ("mx", &["el", "la", "los", "las", "y", "para", "con"], 30),
    ("it", &["il", "lo", "la", "e", "per", "con", "un", "una"], 30),
    ("jp", &[], 30),
    ("br", &["o", "a", "os", "as", "e", "para", "com", "um", "uma"], 30),
];

fn builtin_markets() -> Vec<RuleSet> {
    MARKET_SEEDS
        .iter()
        .map(|(id, stopwords, title_limit)| {
            let mut rs = RuleSet::new(format!("market_{}", id), RuleSetSource::Market)
                .with_label(format!("Market {}", id.to_uppercase()))
                .with_market(*id);
            rs.stopword_overrides = strings(stopwords);
            rs.character_limits.title = Some(*title_limit);
            rs
        })
        .collect()
}
