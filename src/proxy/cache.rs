//! In-memory manifest cache.
//!
//! Holds rendered playlists keyed by request so repeated plays of the same
//! source and interval skip probing and keyframe lookup. Only successful
//! manifests are ever inserted; fallbacks are retried on the next request.

use dashmap::DashMap;
use introskip_core::config::ProxyConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry in the manifest cache.
struct CacheEntry {
    document: Arc<str>,
    last_accessed: Instant,
}

/// Thread-safe, bounded cache of rendered manifests.
///
/// When full, the least recently accessed entry is evicted. Entries idle for
/// longer than the TTL (if any) are treated as absent.
pub struct ManifestCache {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
    ttl: Option<Duration>,
}

impl ManifestCache {
    /// Create a new manifest cache.
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    /// Create a cache sized by the proxy settings.
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.cache_max_entries, config.cache_ttl())
    }

    /// Get a cached manifest, refreshing its access time.
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if !self.is_expired(&entry) {
                entry.last_accessed = Instant::now();
                return Some(Arc::clone(&entry.document));
            }
            // Entry is stale, remove it
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    /// Store a manifest. Re-inserting a key replaces its document.
    pub fn insert(&self, key: impl Into<String>, document: impl Into<Arc<str>>) {
        let key = key.into();

        // Evict old entries if at capacity
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        self.entries.insert(
            key,
            CacheEntry {
                document: document.into(),
                last_accessed: Instant::now(),
            },
        );
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !self.is_expired(&entry))
    }

    /// Remove an entry from the cache.
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_accessed.elapsed() < ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "Cleaned up expired manifests");
        }
        removed
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.last_accessed.elapsed() >= ttl)
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.last_accessed)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}

/// Start a background task that periodically drops idle manifests.
pub fn start_cleanup_task(
    cache: Arc<ManifestCache>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            cache.cleanup_expired();
        }
    })
}
