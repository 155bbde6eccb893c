//! Decision cache
//!
//! Decisions are pure functions of (generation, request), so entries
//! need no TTL: the engine clears the cache wholesale when it swaps
//! generations. Keys are BLAKE3 hashes over every request field,
//! including `as_of`.

use super::decision::{AuthorizeRequest, Decision};
use blake3::Hasher;
use dashmap::DashMap;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached decisions
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

/// Cache key type (BLAKE3 hash)
type CacheKey = [u8; 32];

/// Concurrent decision cache
pub struct DecisionCache {
    entries: DashMap<CacheKey, Decision>,
    config: CacheConfig,
    stats: DashMap<String, usize>,
}

impl DecisionCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            stats: DashMap::new(),
        }
    }

    /// Get a cached decision
    pub fn get(&self, request: &AuthorizeRequest) -> Option<Decision> {
        let key = Self::compute_key(request);
        match self.entries.get(&key) {
            Some(entry) => {
                self.increment_stat("hits");
                Some(entry.clone())
            }
            None => {
                self.increment_stat("misses");
                None
            }
        }
    }

    /// Store a decision
    pub fn put(&self, request: &AuthorizeRequest, decision: Decision) {
        if self.entries.len() >= self.config.capacity {
            self.evict_some();
        }
        self.entries.insert(Self::compute_key(request), decision);
    }

    /// Drop every entry; called on generation swap
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            entries: self.entries.len(),
            max_entries: self.config.capacity,
        }
    }

    /// Hash every field that can influence the decision. Group lists are
    /// hashed sorted so callers listing the same groups in a different
    /// order share an entry.
    fn compute_key(request: &AuthorizeRequest) -> CacheKey {
        let mut hasher = Hasher::new();

        hasher.update(request.user_id.as_bytes());
        hasher.update(request.resource.as_bytes());
        hasher.update(request.action.as_bytes());
        hasher.update(request.requested_scope.to_string().as_bytes());

        if let Some(owner) = &request.resource_owner {
            hasher.update(b"owner");
            hasher.update(owner.as_bytes());
        }
        if let Some(group) = &request.resource_group {
            hasher.update(b"group");
            hasher.update(group.as_bytes());
        }

        let mut path = request.resource_group_path.clone();
        path.sort();
        for group in &path {
            hasher.update(b"path");
            hasher.update(group.as_bytes());
        }

        let mut groups = request.user_groups.clone();
        groups.sort();
        for group in &groups {
            hasher.update(b"member");
            hasher.update(group.as_bytes());
        }

        hasher.update(&request.as_of.timestamp_micros().to_le_bytes());

        *hasher.finalize().as_bytes()
    }

    /// Coarse eviction: drop roughly 10% of entries when full
    fn evict_some(&self) {
        let to_remove = (self.config.capacity / 10).max(1);
        let mut removed = 0;
        self.entries.retain(|_, _| {
            if removed < to_remove {
                removed += 1;
                false
            } else {
                true
            }
        });
    }

    fn increment_stat(&self, key: &str) {
        self.stats
            .entry(key.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
    pub max_entries: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
