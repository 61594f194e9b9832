//! Intent pattern loader
//! Loads the effective pattern book for a scope: remote source first, then the
//! last-good snapshot, then the hardcoded fallback table. Loading never fails.

use std::sync::Arc;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::cache::PatternCache;
use super::defaults::fallback_intent_patterns;
use super::model::{IntentPatternConfig, IntentType};
use super::snapshot::PatternSnapshotStore;
use crate::compiler::{IntentPatternSet, PatternCompiler};
use crate::config::{GlobalConfig, RemoteOptions};
use crate::error::{AsoError, AsoResult};

const PATTERN_RPC_PATH: &str = "rest/v1/rpc/get_effective_intent_patterns";
const USER_AGENT: &str = concat!("aso-bible/", env!("CARGO_PKG_VERSION"));

// ======== Scope and remote rows ========

/// Which overrides a pattern lookup resolves against
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternScope {
    pub vertical: Option<String>,
    pub market: Option<String>,
    pub organization_id: Option<String>,
    pub app_id: Option<String>,
}

impl PatternScope {
    pub fn new(vertical: Option<&str>, market: Option<&str>) -> Self {
        Self {
            vertical: vertical.map(str::to_string),
            market: market.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_app(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Stable string form, used as the snapshot key
    pub fn cache_key(&self) -> String {
        let part = |v: &Option<String>| v.as_deref().unwrap_or("*").to_string();
        format!(
            "v={}|m={}|o={}|a={}",
            part(&self.vertical),
            part(&self.market),
            part(&self.organization_id),
            part(&self.app_id)
        )
    }
}

/// Row returned by the effective-pattern RPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPatternRow {
    pub pattern: String,
    pub intent_type: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub word_boundary: Option<bool>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub effective_weight: Option<f64>,
    #[serde(default)]
    pub effective_priority: Option<u32>,
}

impl IntentPatternRow {
    pub fn new(pattern: impl Into<String>, intent_type: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            intent_type: intent_type.into(),
            weight: None,
            priority: None,
            is_regex: false,
            case_sensitive: false,
            word_boundary: None,
            example: None,
            scope: None,
            effective_weight: None,
            effective_priority: None,
        }
    }

    /// Effective values win over the row's base weight/priority
    pub fn into_config(self) -> Option<IntentPatternConfig> {
        let intent_type = IntentType::parse(&self.intent_type)?;
        Some(IntentPatternConfig {
            weight: self.effective_weight.or(self.weight).unwrap_or(1.0),
            priority: self.effective_priority.or(self.priority).unwrap_or(0),
            is_regex: self.is_regex,
            case_sensitive: self.case_sensitive,
            word_boundary: self.word_boundary.unwrap_or(!self.is_regex),
            example: self.example,
            pattern: self.pattern,
            intent_type,
        })
    }
}

// ======== Pattern sources ========

/// Where effective intent patterns come from
#[async_trait]
pub trait PatternSource: Send + Sync {
    async fn fetch_intent_patterns(&self, scope: &PatternScope) -> AsoResult<Vec<IntentPatternRow>>;
}

/// Effective-pattern RPC over HTTP
pub struct RemotePatternSource {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl RemotePatternSource {
    pub fn new(options: &RemoteOptions) -> AsoResult<Self> {
        let client = Client::builder().timeout(options.timeout).build()?;
        let mut base = Url::parse(&options.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(PATTERN_RPC_PATH)?;
        Ok(Self {
            client,
            endpoint,
            api_key: options.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PatternSource for RemotePatternSource {
    async fn fetch_intent_patterns(&self, scope: &PatternScope) -> AsoResult<Vec<IntentPatternRow>> {
        let body = serde_json::json!({
            "p_vertical": scope.vertical,
            "p_market": scope.market,
            "p_organization_id": scope.organization_id,
            "p_app_id": scope.app_id,
        });

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("User-Agent", USER_AGENT)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AsoError::RuleLoadError(format!(
                "Pattern RPC {} returned status {}",
                self.endpoint,
                response.status()
            )));
        }

        let rows: Vec<IntentPatternRow> = response.json().await?;
        debug!("Pattern RPC returned {} rows for [{}]", rows.len(), scope.cache_key());
        Ok(rows)
    }
}

/// Source used when no remote is configured; always degrades to local data
pub struct NoRemoteSource;

#[async_trait]
impl PatternSource for NoRemoteSource {
    async fn fetch_intent_patterns(&self, _scope: &PatternScope) -> AsoResult<Vec<IntentPatternRow>> {
        Err(AsoError::RuleLoadError("no remote pattern source configured".to_string()))
    }
}

// ======== Service ========

/// Loads, compiles and caches intent pattern sets
pub struct IntentPatternService {
    source: Arc<dyn PatternSource>,
    cache: PatternCache,
    snapshot: Option<PatternSnapshotStore>,
}

impl IntentPatternService {
    pub fn new(source: Arc<dyn PatternSource>, config: &GlobalConfig) -> Self {
        Self {
            source,
            cache: PatternCache::new(config.pattern_cache_ttl),
            snapshot: config.snapshot_path.clone().map(PatternSnapshotStore::new),
        }
    }

    /// Service wired from config: remote RPC when configured, local data otherwise
    pub fn from_config(config: &GlobalConfig) -> AsoResult<Self> {
        let source: Arc<dyn PatternSource> = match &config.remote {
            Some(remote) => Arc::new(RemotePatternSource::new(remote)?),
            None => Arc::new(NoRemoteSource),
        };
        Ok(Self::new(source, config))
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    /// Effective pattern set for `scope`; never fails
    pub async fn load_intent_patterns(&self, scope: &PatternScope) -> Arc<IntentPatternSet> {
        if let Some(cached) = self.cache.get(scope) {
            debug!("Intent pattern cache hit [{}]", scope.cache_key());
            return cached;
        }
        debug!("Intent pattern cache miss [{}]", scope.cache_key());

        let set = Arc::new(self.resolve(scope).await);
        self.cache.insert(scope.clone(), set.clone());
        set
    }

    /// Drop cached sets; the next load refetches
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    async fn resolve(&self, scope: &PatternScope) -> IntentPatternSet {
        // 1. Remote source
        match self.source.fetch_intent_patterns(scope).await {
            Ok(rows) => {
                let set = Self::compile_rows(rows.clone());
                if !set.is_empty() {
                    self.save_snapshot(scope, &rows).await;
                    return set;
                }
                warn!("Pattern source returned no usable patterns for [{}]", scope.cache_key());
            }
            Err(e) => {
                warn!("Pattern source failed for [{}]: {}", scope.cache_key(), e);
            }
        }

        // 2. Last-good snapshot
        if let Some(set) = self.load_snapshot(scope).await {
            warn!("Serving intent patterns for [{}] from snapshot", scope.cache_key());
            return set;
        }

        // 3. Hardcoded fallback
        warn!("Serving fallback intent patterns for [{}]", scope.cache_key());
        PatternCompiler::compile(fallback_intent_patterns(), true)
    }

    fn compile_rows(rows: Vec<IntentPatternRow>) -> IntentPatternSet {
        let configs: Vec<IntentPatternConfig> = rows
            .into_iter()
            .filter_map(|row| {
                let pattern = row.pattern.clone();
                let intent_type = row.intent_type.clone();
                let config = row.into_config();
                if config.is_none() {
                    warn!("Skipping pattern row {:?}: unknown intent type {:?}", pattern, intent_type);
                }
                config
            })
            .collect();
        PatternCompiler::compile(configs, false)
    }

    async fn save_snapshot(&self, scope: &PatternScope, rows: &[IntentPatternRow]) {
        let Some(snapshot) = &self.snapshot else { return };
        if let Err(e) = snapshot.save(scope, rows).await {
            warn!("Failed to write pattern snapshot {}: {}", snapshot.path().display(), e);
        }
    }

    async fn load_snapshot(&self, scope: &PatternScope) -> Option<IntentPatternSet> {
        let snapshot = self.snapshot.as_ref()?;
        match snapshot.load(scope).await {
            Ok(Some(rows)) => {
                let set = Self::compile_rows(rows);
                (!set.is_empty()).then_some(set)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read pattern snapshot {}: {}", snapshot.path().display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use crate::config::ConfigManager;

    struct StaticSource {
        rows: Vec<IntentPatternRow>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(rows: Vec<IntentPatternRow>) -> Arc<Self> {
            Arc::new(Self { rows, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl PatternSource for StaticSource {
        async fn fetch_intent_patterns(&self, _scope: &PatternScope) -> AsoResult<Vec<IntentPatternRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    fn remote_rows() -> Vec<IntentPatternRow> {
        vec![
            IntentPatternRow::new("cheapest", "commercial"),
            IntentPatternRow::new("lesson", "informational"),
        ]
    }

    #[tokio::test]
    async fn test_unavailable_source_uses_fallback() {
        let config = ConfigManager::get_default();
        let service = IntentPatternService::new(Arc::new(NoRemoteSource), &config);

        let set = service.load_intent_patterns(&PatternScope::default()).await;
        assert!(set.fallback_mode);
        assert!(set.configs().any(|c| c.pattern == "learn"));
    }

    #[tokio::test]
    async fn test_empty_source_uses_fallback() {
        let config = ConfigManager::get_default();
        let service = IntentPatternService::new(StaticSource::new(Vec::new()), &config);

        let set = service.load_intent_patterns(&PatternScope::default()).await;
        assert!(set.fallback_mode);
    }

    #[tokio::test]
    async fn test_cache_hit_and_invalidate() {
        let config = ConfigManager::get_default();
        let source = StaticSource::new(remote_rows());
        let service = IntentPatternService::new(source.clone(), &config);
        let scope = PatternScope::new(Some("finance"), Some("us"));

        let first = service.load_intent_patterns(&scope).await;
        let second = service.load_intent_patterns(&scope).await;
        assert!(!first.fallback_mode);
        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        service.invalidate();
        service.load_intent_patterns(&scope).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_ttl_refetches() {
        let config = ConfigManager::custom().pattern_cache_ttl(Duration::ZERO).build();
        let source = StaticSource::new(remote_rows());
        let service = IntentPatternService::new(source.clone(), &config);

        service.load_intent_patterns(&PatternScope::default()).await;
        service.load_intent_patterns(&PatternScope::default()).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_snapshot_served_when_remote_goes_down() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigManager::custom()
            .snapshot_path(dir.path().join("patterns.mp"))
            .build();
        let scope = PatternScope::new(Some("finance"), None);

        let online = IntentPatternService::new(StaticSource::new(remote_rows()), &config);
        online.load_intent_patterns(&scope).await;

        let offline = IntentPatternService::new(Arc::new(NoRemoteSource), &config);
        let set = offline.load_intent_patterns(&scope).await;
        assert!(!set.fallback_mode);
        assert!(set.configs().any(|c| c.pattern == "cheapest"));

        // Snapshot is per scope
        let other = offline.load_intent_patterns(&PatternScope::new(Some("dating"), None)).await;
        assert!(other.fallback_mode);
    }

    #[test]
    fn test_row_effective_values_win() {
        let json = r#"{
            "pattern": "best",
            "intent_type": "commercial",
            "weight": 1.0,
            "priority": 10,
            "is_regex": false,
            "case_sensitive": false,
            "word_boundary": true,
            "example": "best budget app",
            "scope": "vertical",
            "effective_weight": 2.5,
            "effective_priority": 150
        }"#;
        let row: IntentPatternRow = serde_json::from_str(json).unwrap();
        let config = row.into_config().unwrap();
        assert_eq!(config.weight, 2.5);
        assert_eq!(config.priority, 150);
        assert_eq!(config.intent_type, IntentType::Commercial);
        assert_eq!(config.example.as_deref(), Some("best budget app"));

        assert!(IntentPatternRow::new("x", "emotional").into_config().is_none());
    }

    #[test]
    fn test_remote_endpoint_join() {
        let source = RemotePatternSource::new(&RemoteOptions::new("https://db.example.com")).unwrap();
        assert_eq!(
            source.endpoint().as_str(),
            "https://db.example.com/rest/v1/rpc/get_effective_intent_patterns"
        );
        let nested = RemotePatternSource::new(&RemoteOptions::new("https://host/api")).unwrap();
        assert_eq!(
            nested.endpoint().as_str(),
            "https://host/api/rest/v1/rpc/get_effective_intent_patterns"
        );
    }
}
