//! Vertical and market detection
//! Pure and deterministic: identical metadata always yields the identical result.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use crate::profile::{
    base_vertical_profile, default_market_profile, map_category_to_vertical, normalize_locale,
    MarketProfile, VerticalProfile, MARKET_PROFILES, VERTICAL_PROFILES,
};
use crate::rule::AppMetadata;

const CATEGORY_UNIQUE_CONFIDENCE: f64 = 0.9;
const CATEGORY_TIEBREAK_BASE: f64 = 0.6;
const CATEGORY_TIEBREAK_CAP: f64 = 0.85;
const KEYWORD_SCAN_BASE: f64 = 0.4;
const KEYWORD_SCAN_CAP: f64 = 0.8;
const ACCEPT_CONFIDENCE: f64 = 0.7;
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Vertical detection outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerticalDetection {
    pub vertical_id: &'static str,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub matched_signals: Vec<String>,
}

/// Market detection outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketDetection {
    pub market_id: &'static str,
    /// Normalized locale
    pub locale: String,
    #[serde(skip)]
    pub market: &'static MarketProfile,
}

/// Word-boundary keyword matchers per vertical, compiled once
static KEYWORD_MATCHERS: Lazy<Vec<(&'static str, Vec<(&'static str, Regex)>)>> = Lazy::new(|| {
    VERTICAL_PROFILES
        .iter()
        .map(|profile| {
            let matchers = profile
                .keywords
                .iter()
                .filter_map(|kw| {
                    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(kw)))
                        .case_insensitive(true)
                        .build()
                        .ok()
                        .map(|re| (*kw, re))
                })
                .collect();
            (profile.id, matchers)
        })
        .collect()
});

/// Keywords of `profile` found in `text`
fn keyword_hits(profile: &VerticalProfile, text: &str) -> Vec<&'static str> {
    KEYWORD_MATCHERS
        .iter()
        .find(|(id, _)| *id == profile.id)
        .map(|(_, matchers)| {
            matchers
                .iter()
                .filter(|(_, re)| re.is_match(text))
                .map(|(kw, _)| *kw)
                .collect()
        })
        .unwrap_or_default()
}

/// Best-scoring profile by keyword hits; ties keep the earlier profile
fn best_by_keywords<'a, I>(profiles: I, text: &str) -> Option<(&'static VerticalProfile, Vec<&'static str>)>
where
    I: IntoIterator<Item = &'a &'static VerticalProfile>,
{
    let mut best: Option<(&'static VerticalProfile, Vec<&'static str>)> = None;
    for profile in profiles {
        let hits = keyword_hits(profile, text);
        let better = match &best {
            Some((_, best_hits)) => hits.len() > best_hits.len(),
            None => true,
        };
        if better {
            best = Some((*profile, hits));
        }
    }
    best
}

fn keyword_signals(hits: &[&str]) -> Vec<String> {
    hits.iter().map(|kw| format!("keyword:{}", kw)).collect()
}

/// Infer which vertical applies to a piece of app metadata
pub fn detect_vertical(metadata: &AppMetadata) -> VerticalDetection {
    let text = format!("{} {}", metadata.title, metadata.subtitle);
    let category = metadata.category.as_deref().unwrap_or("");
    let candidates = map_category_to_vertical(category);

    // 1. Category maps to exactly one vertical
    if candidates.len() == 1 {
        let detection = VerticalDetection {
            vertical_id: candidates[0].id,
            confidence: CATEGORY_UNIQUE_CONFIDENCE,
            matched_signals: vec![format!("category:{}", category.trim())],
        };
        debug!("Vertical detected by category: {:?}", detection);
        return detection;
    }

    // 2. Several candidates: keyword overlap breaks the tie
    let mut current: Option<VerticalDetection> = None;
    if candidates.len() > 1 {
        if let Some((profile, hits)) = best_by_keywords(&candidates, &text) {
            let confidence = (CATEGORY_TIEBREAK_BASE + 0.05 * hits.len() as f64).min(CATEGORY_TIEBREAK_CAP);
            let mut signals = vec![format!("category:{}", category.trim())];
            signals.extend(keyword_signals(&hits));
            current = Some(VerticalDetection {
                vertical_id: profile.id,
                confidence,
                matched_signals: signals,
            });
        }
    }

    if let Some(detection) = &current {
        if detection.confidence >= ACCEPT_CONFIDENCE {
            debug!("Vertical detected by category tie-break: {:?}", detection);
            return detection.clone();
        }
    }

    // 3. Keyword scan over every vertical
    let all: Vec<&'static VerticalProfile> = VERTICAL_PROFILES.iter().collect();
    if let Some((profile, hits)) = best_by_keywords(&all, &text) {
        if !hits.is_empty() {
            let confidence = (KEYWORD_SCAN_BASE + 0.1 * hits.len() as f64).min(KEYWORD_SCAN_CAP);
            let better = current.as_ref().map_or(true, |c| confidence > c.confidence);
            if better {
                current = Some(VerticalDetection {
                    vertical_id: profile.id,
                    confidence,
                    matched_signals: keyword_signals(&hits),
                });
            }
        }
    }

    // 4. Vertical-agnostic default
    let detection = current.unwrap_or_else(|| VerticalDetection {
        vertical_id: base_vertical_profile().id,
        confidence: DEFAULT_CONFIDENCE,
        matched_signals: Vec::new(),
    });
    debug!("Vertical detection result: {:?}", detection);
    detection
}

/// Resolve a raw locale to a market; unresolved locales fall back to `us`
pub fn detect_market(locale: &str) -> MarketDetection {
    let normalized = normalize_locale(locale);
    let market = MARKET_PROFILES
        .iter()
        .find(|m| m.locales.iter().any(|l| l.eq_ignore_ascii_case(&normalized)))
        .unwrap_or_else(|| {
            debug!("Locale [{}] not served by any market, using default", locale);
            default_market_profile()
        });

    MarketDetection {
        market_id: market.id,
        locale: normalized,
        market,
    }
}
