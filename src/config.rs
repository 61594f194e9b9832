//! Global configuration: every tunable of the engine lives here

use std::path::PathBuf;
use std::time::Duration;

/// Remote configuration store connection
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    /// Base URL of the configuration store, e.g. `https://project.example.co`
    pub base_url: String,
    /// API key sent as both `apikey` and bearer token
    pub api_key: Option<String>,
    /// HTTP timeout
    pub timeout: Duration,
}

impl RemoteOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Intent classification thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationThresholds {
    /// Share of the total phrase score the top intent must exceed to be dominant.
    /// Pending product-owner confirmation.
    pub dominance_ratio: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self { dominance_ratio: 0.5 }
    }
}

/// Cross-vertical signature overlap thresholds.
/// Pending product-owner confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakThresholds {
    pub token_medium: usize,
    pub intent_medium: usize,
    pub token_high: usize,
    pub intent_high: usize,
}

impl Default for LeakThresholds {
    fn default() -> Self {
        Self {
            token_medium: 5,
            intent_medium: 3,
            token_high: 8,
            intent_high: 5,
        }
    }
}

/// Keyword combination limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboLimits {
    pub min_length: usize,
    pub max_length: usize,
    /// Budget per keyword pool (title, subtitle, cross); the total cap is three times this
    pub max_combos_per_source: usize,
}

pub const MAX_COMBOS_PER_SOURCE: usize = 500;

impl ComboLimits {
    pub fn max_total(&self) -> usize {
        self.max_combos_per_source * 3
    }
}

impl Default for ComboLimits {
    fn default() -> Self {
        Self {
            min_length: 2,
            max_length: 4,
            max_combos_per_source: MAX_COMBOS_PER_SOURCE,
        }
    }
}

/// Global configuration
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // Pattern cache lifetime
    pub pattern_cache_ttl: Duration,
    // Remote pattern store, None means always fallback
    pub remote: Option<RemoteOptions>,
    // Last-good pattern snapshot (MessagePack)
    pub snapshot_path: Option<PathBuf>,
    pub classification: ClassificationThresholds,
    pub leak: LeakThresholds,
    pub combos: ComboLimits,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            pattern_cache_ttl: Duration::from_secs(5 * 60),
            remote: None,
            snapshot_path: None,
            classification: ClassificationThresholds::default(),
            leak: LeakThresholds::default(),
            combos: ComboLimits::default(),
        }
    }
}

/// Configuration entry point
pub struct ConfigManager;

impl ConfigManager {
    /// Default configuration
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// Start a custom configuration
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// Chainable configuration builder
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.pattern_cache_ttl = ttl;
        self
    }

    pub fn remote(mut self, remote: RemoteOptions) -> Self {
        self.config.remote = Some(remote);
        self
    }

    pub fn snapshot_path(mut self, path: PathBuf) -> Self {
        self.config.snapshot_path = Some(path);
        self
    }

    pub fn classification(mut self, thresholds: ClassificationThresholds) -> Self {
        self.config.classification = thresholds;
        self
    }

    pub fn leak_thresholds(mut self, thresholds: LeakThresholds) -> Self {
        self.config.leak = thresholds;
        self
    }

    pub fn combo_limits(mut self, limits: ComboLimits) -> Self {
        self.config.combos = limits;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = ConfigManager::custom()
            .pattern_cache_ttl(Duration::from_secs(1))
            .remote(RemoteOptions::new("https://store.example.com"))
            .leak_thresholds(LeakThresholds { token_medium: 2, ..Default::default() })
            .build();

        assert_eq!(config.pattern_cache_ttl, Duration::from_secs(1));
        assert_eq!(config.remote.unwrap().base_url, "https://store.example.com");
        assert_eq!(config.leak.token_medium, 2);
        assert_eq!(config.leak.token_high, 8);
        assert_eq!(config.combos.max_total(), 1500);
    }

    #[test]
    fn test_default_ttl_is_five_minutes() {
        assert_eq!(ConfigManager::get_default().pattern_cache_ttl, Duration::from_secs(300));
    }
}
