//! Caching for loaded rule sets.
//!
//! The engine itself never caches: it is handed an immutable [`RuleSet`]
//! per call. Callers that evaluate frequently can memoize loading through
//! this TTL-bounded cache instead of re-reading the rule file on every run.

use moka::sync::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use covenant_core::{LoadedRuleSet, RuleSet, RuleStoreError};

/// TTL-bounded cache of loaded rule sets, keyed by file path.
///
/// Invalidation is time-based only; use [`RuleSetCache::invalidate`] after
/// editing a rule file to pick up changes immediately.
pub struct RuleSetCache {
    cache: Cache<PathBuf, Arc<RuleSet>>,
}

impl RuleSetCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Load a rule set through the cache.
    ///
    /// On a miss this goes through [`LoadedRuleSet::load`] (missing file
    /// resolves to an empty set) and logs every load warning before caching
    /// the parsed rules.
    pub fn load(&self, path: &Path) -> Result<Arc<RuleSet>, RuleStoreError> {
        if let Some(rules) = self.cache.get(path) {
            return Ok(rules);
        }

        let loaded = LoadedRuleSet::load(path)?;
        for warning in &loaded.warnings {
            tracing::warn!(rule_file = %path.display(), %warning, "rule load warning");
        }

        let rules = Arc::new(loaded.rules);
        self.cache.insert(path.to_path_buf(), Arc::clone(&rules));
        Ok(rules)
    }

    /// Drop a single cached rule set.
    pub fn invalidate(&self, path: &Path) {
        self.cache.invalidate(path);
    }

    /// Drop everything.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for RuleSetCache {
    fn default() -> Self {
        Self::new(64, Duration::from_secs(60))
    }
}
