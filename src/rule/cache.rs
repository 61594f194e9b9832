//! Time-boxed intent pattern cache
//! Written only by the loader and by explicit invalidation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use super::loader::PatternScope;
use crate::compiler::IntentPatternSet;

struct CacheEntry {
    value: Arc<IntentPatternSet>,
    expires_at: Instant,
}

/// Pattern sets cached per scope for a fixed TTL
pub struct PatternCache {
    ttl: Duration,
    entries: RwLock<HashMap<PatternScope, CacheEntry>>,
}

impl PatternCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while holding the lock cannot leave an entry half-written, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PatternScope, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PatternScope, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Unexpired entry for `scope`
    pub fn get(&self, scope: &PatternScope) -> Option<Arc<IntentPatternSet>> {
        let entries = self.read();
        entries
            .get(scope)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, scope: PatternScope, value: Arc<IntentPatternSet>) {
        let expires_at = Instant::now() + self.ttl;
        self.write().insert(scope, CacheEntry { value, expires_at });
    }

    /// Drop every entry; the next load refetches
    pub fn invalidate(&self) {
        let mut entries = self.write();
        debug!("Invalidating intent pattern cache ({} entries)", entries.len());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
