//! In-memory memoization of tool responses.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Cache entry for a response.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// The cached response.
    value: V,

    /// Insertion sequence number, used for eviction.
    inserted: u64,
}

/// Bounded cache of responses keyed by request.
///
/// Entries live for the lifetime of the cache; once `max_entries` is reached
/// the oldest entry is evicted. Clones share the same storage.
#[derive(Debug)]
pub struct ResponseCache<V> {
    /// In-memory cache.
    cache: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,

    /// Next insertion sequence number.
    counter: Arc<AtomicU64>,

    /// Maximum cache size.
    max_entries: usize,
}

impl<V> Clone for ResponseCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            counter: Arc::clone(&self.counter),
            max_entries: self.max_entries,
        }
    }
}

impl<V: Clone> ResponseCache<V> {
    /// Create a new cache holding at most `max_entries` responses.
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            counter: Arc::new(AtomicU64::new(0)),
            max_entries: max_entries.max(1),
        }
    }

    /// Get a response from the cache.
    pub async fn get(&self, key: &str) -> Option<V> {
        let cache = self.cache.read().await;
        cache.get(key).map(|e| e.value.clone())
    }

    /// Put a response in the cache.
    pub async fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let entry = CacheEntry {
            value,
            inserted: self.counter.fetch_add(1, Ordering::Relaxed),
        };

        let mut cache = self.cache.write().await;

        // Evict if at capacity
        if cache.len() >= self.max_entries && !cache.contains_key(&key) {
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, v)| v.inserted)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }

        debug!("Cached response for {key}");
        cache.insert(key, entry);
    }

    /// Check if a response is cached.
    pub async fn contains(&self, key: &str) -> bool {
        self.cache.read().await.contains_key(key)
    }

    /// Clear the entire cache.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
        info!("Cleared response cache");
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.read().await.len(),
            max_entries: self.max_entries,
        }
    }
}

/// Statistics about a response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entries in cache.
    pub entries: usize,

    /// Maximum cache size.
    pub max_entries: usize,
}
