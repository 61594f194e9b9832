//! Combo analysis
//! Generates combos from title/subtitle text and marks which already exist in the metadata.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::generator::{generate_all_possible_combos, ComboOptions};
use crate::utils::tokenize;

/// Separators that end a brand prefix, e.g. "Duolingo: Learn Spanish"
const BRAND_SEPARATORS: &[&str] = &[":", " - ", " – ", " | "];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboSource {
    Title,
    Subtitle,
    Both,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCombo {
    pub text: String,
    pub keywords: Vec<String>,
    pub length: usize,
    pub exists: bool,
    pub source: ComboSource,
    /// 0 - 100
    pub strategic_value: u8,
}

#[derive(Debug, Clone, Default)]
pub struct ComboAnalysisOptions {
    pub combos: ComboOptions,
    /// Brand to use instead of the one detected from the title
    pub brand_override: Option<String>,
    /// Drop missing combos that contain the brand
    pub filter_brand: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboStats {
    pub total: usize,
    pub existing: usize,
    pub missing: usize,
    /// existing / total * 100
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboAnalysis {
    pub all_combos: Vec<GeneratedCombo>,
    pub existing_combos: Vec<GeneratedCombo>,
    pub missing_combos: Vec<GeneratedCombo>,
    pub brand: Option<String>,
    pub stats: ComboStats,
}

/// Heuristic placeholder score by combo length; not a search-volume model
pub fn strategic_value(length: usize) -> u8 {
    let bonus = match length {
        2 => 10,
        3 => 20,
        4 => 15,
        _ => 0,
    };
    50 + bonus
}

/// Title prefix before the first brand separator
pub fn detect_brand(title: &str) -> Option<String> {
    let cut = BRAND_SEPARATORS.iter().filter_map(|sep| title.find(sep)).min()?;
    let brand = title[..cut].trim();
    (!brand.is_empty()).then(|| brand.to_lowercase())
}

/// Exact substring, or every word in order with anything in between
pub fn combo_exists_in(combo: &str, text: &str) -> bool {
    let combo = combo.trim().to_lowercase();
    let text = text.to_lowercase();
    if combo.is_empty() {
        return false;
    }
    if text.contains(&combo) {
        return true;
    }
    let mut pos = 0;
    for word in combo.split_whitespace() {
        match text[pos..].find(word) {
            Some(idx) => pos += idx + word.len(),
            None => return false,
        }
    }
    true
}

fn classify_source(combo: &str, title: &str, subtitle: &str) -> ComboSource {
    match (combo_exists_in(combo, title), combo_exists_in(combo, subtitle)) {
        (true, true) => ComboSource::Both,
        (true, false) => ComboSource::Title,
        (false, true) => ComboSource::Subtitle,
        (false, false) => ComboSource::Missing,
    }
}

/// Generate every combo from the metadata text and check which already exist
pub fn analyze_all_combos(title: &str, subtitle: &str, options: &ComboAnalysisOptions) -> ComboAnalysis {
    let title_tokens = tokenize(title);
    let subtitle_tokens = tokenize(subtitle);
    let texts = generate_all_possible_combos(&title_tokens, &subtitle_tokens, &options.combos);

    let brand = options
        .brand_override
        .as_deref()
        .map(|b| b.trim().to_lowercase())
        .filter(|b| !b.is_empty())
        .or_else(|| detect_brand(title));
    let brand_tokens = brand.as_deref().map(tokenize).unwrap_or_default();

    let mut all_combos = Vec::with_capacity(texts.len());
    let mut existing_combos = Vec::new();
    let mut missing_combos = Vec::new();
    let mut brand_filtered = 0;

    for text in texts {
        let keywords: Vec<String> = text.split(' ').map(str::to_string).collect();
        let source = classify_source(&text, title, subtitle);
        let combo = GeneratedCombo {
            length: keywords.len(),
            exists: source != ComboSource::Missing,
            strategic_value: strategic_value(keywords.len()),
            source,
            keywords,
            text,
        };

        if combo.exists {
            existing_combos.push(combo.clone());
        } else {
            if options.filter_brand && combo.keywords.iter().any(|k| brand_tokens.contains(k)) {
                brand_filtered += 1;
                continue;
            }
            missing_combos.push(combo.clone());
        }
        all_combos.push(combo);
    }

    let total = all_combos.len();
    let stats = ComboStats {
        total,
        existing: existing_combos.len(),
        missing: missing_combos.len(),
        coverage: if total == 0 { 0.0 } else { existing_combos.len() as f64 / total as f64 * 100.0 },
    };
    debug!(
        "Combo analysis: {} total, {} existing, {} missing, {} brand-filtered",
        stats.total, stats.existing, stats.missing, brand_filtered
    );

    ComboAnalysis {
        all_combos,
        existing_combos,
        missing_combos,
        brand,
        stats,
    }
}

/// Combos containing `keyword` as one of their words
pub fn filter_combos_by_keyword<'a>(combos: &'a [GeneratedCombo], keyword: &str) -> Vec<&'a GeneratedCombo> {
    let keyword = keyword.trim().to_lowercase();
    combos.iter().filter(|c| c.keywords.iter().any(|k| *k == keyword)).collect()
}

pub fn group_combos_by_length(combos: &[GeneratedCombo]) -> BTreeMap<usize, Vec<&GeneratedCombo>> {
    let mut groups: BTreeMap<usize, Vec<&GeneratedCombo>> = BTreeMap::new();
    for combo in combos {
        groups.entry(combo.length).or_default().push(combo);
    }
    groups
}
