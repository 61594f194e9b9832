//! Market profiles and locale normalization

/// Locale-specific configuration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketProfile {
    pub id: &'static str,
    pub label: &'static str,
    /// Canonical `ll-CC` locales served by this market
    pub locales: &'static [&'static str],
    pub rule_set_id: Option<&'static str>,
}

pub const DEFAULT_MARKET_ID: &str = "us";

pub static MARKET_PROFILES: &[MarketProfile] = &[
    MarketProfile { id: "us", label: "United States", locales: &["en-US"], rule_set_id: Some("market_us") },
    MarketProfile { id: "gb", label: "United Kingdom", locales: &["en-GB"], rule_set_id: Some("market_gb") },
    MarketProfile { id: "ca", label: "Canada", locales: &["en-CA", "fr-CA"], rule_set_id: Some("market_ca") },
    MarketProfile { id: "au", label: "Australia", locales: &["en-AU"], rule_set_id: Some("market_au") },
    MarketProfile { id: "de", label: "Germany", locales: &["de-DE", "de-AT", "de-CH"], rule_set_id: Some("market_de") },
    MarketProfile { id: "fr", label: "France", locales: &["fr-FR"], rule_set_id: Some("market_fr") },
    MarketProfile { id: "es", label: "Spain", locales: &["es-ES"], rule_set_id: Some("market_es") },
    MarketProfile { id: "mx", label: "Mexico", locales: &["es-MX"], rule_set_id: Some("market_mx") },
    MarketProfile { id: "it", label: "Italy", locales: &["it-IT"], rule_set_id: Some("market_it") },
    MarketProfile { id: "jp", label: "Japan", locales: &["ja-JP"], rule_set_id: Some("market_jp") },
    MarketProfile { id: "br", label: "Brazil", locales: &["pt-BR"], rule_set_id: Some("market_br") },
];

/// Country code -> canonical locale
static COUNTRY_LOCALES: &[(&str, &str)] = &[
    ("US", "en-US"), ("GB", "en-GB"), ("UK", "en-GB"), ("CA", "en-CA"), ("AU", "en-AU"),
    ("DE", "de-DE"), ("AT", "de-AT"), ("CH", "de-CH"), ("FR", "fr-FR"), ("ES", "es-ES"),
    ("MX", "es-MX"), ("IT", "it-IT"), ("JP", "ja-JP"), ("BR", "pt-BR"),
];

/// Language -> canonical country
static LANGUAGE_COUNTRIES: &[(&str, &str)] = &[
    ("en", "US"), ("de", "DE"), ("fr", "FR"), ("es", "ES"), ("it", "IT"), ("ja", "JP"), ("pt", "BR"),
];

pub fn get_market_profile(id: &str) -> Option<&'static MarketProfile> {
    MARKET_PROFILES.iter().find(|m| m.id.eq_ignore_ascii_case(id))
}

pub fn default_market_profile() -> &'static MarketProfile {
    &MARKET_PROFILES[0]
}

/// Normalize a raw locale to `ll-CC`:
/// `en_US` -> `en-US`, `US` -> `en-US`, `de` -> `de-DE`.
/// Unknown inputs are returned with separators and casing normalized.
pub fn normalize_locale(raw: &str) -> String {
    let cleaned = raw.trim().replace('_', "-");
    let parts: Vec<&str> = cleaned.split('-').filter(|p| !p.is_empty()).collect();

    match parts.as_slice() {
        [] => String::new(),
        [single] => {
            let is_country = single.len() == 2 && single.chars().all(|c| c.is_ascii_uppercase());
            if is_country {
                if let Some((_, locale)) = COUNTRY_LOCALES.iter().find(|(cc, _)| cc == single) {
                    return locale.to_string();
                }
                return single.to_string();
            }
            let lang = single.to_ascii_lowercase();
            match LANGUAGE_COUNTRIES.iter().find(|(l, _)| *l == lang) {
                Some((_, country)) => format!("{}-{}", lang, country),
                None => lang,
            }
        }
        [lang, .., region] => format!("{}-{}", lang.to_ascii_lowercase(), region.to_ascii_uppercase()),
    }
}
