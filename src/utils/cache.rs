// src/utils/cache.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Process-local TTL cache fronting the thread listing reads.
///
/// Writers evict by key prefix before reporting success, so a reader never
/// observes a tree older than the last mutation of its attachment; entries
/// that were never invalidated still expire after the configured TTL.
#[derive(Clone)]
pub struct TtlCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.value.clone())
    }

    pub async fn set(&self, key: &str, value: serde_json::Value) {
        let mut entries = self.entries.write().await;
        // opportunistic sweep keeps dead entries from piling up
        entries.retain(|_, entry| entry.expires_at > Instant::now());
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops every entry whose key starts with `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        entries.retain(|key, _| !key.starts_with(prefix));
    }

    pub async fn flush(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("thread:post:1:anon", json!([1, 2, 3])).await;
        assert_eq!(cache.get("thread:post:1:anon").await, Some(json!([1, 2, 3])));
    }

    #[tokio::test]
    async fn expired_entries_are_gone() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("k", json!("v")).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn prefix_invalidation_only_touches_matching_keys() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("thread:post:1:anon", json!(1)).await;
        cache.set("thread:post:1:mod", json!(2)).await;
        cache.set("thread:post:11:anon", json!(3)).await;

        cache.invalidate_prefix("thread:post:1:").await;

        assert_eq!(cache.get("thread:post:1:anon").await, None);
        assert_eq!(cache.get("thread:post:1:mod").await, None);
        assert_eq!(cache.get("thread:post:11:anon").await, Some(json!(3)));
    }

    #[tokio::test]
    async fn flush_empties_the_cache() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", json!(1)).await;
        cache.flush().await;
        assert_eq!(cache.get("a").await, None);
    }
}
