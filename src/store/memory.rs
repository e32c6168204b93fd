use crate::core::cache::{CacheEntry, CacheLookup, KeyValueCollection};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection, lives as long as the process.
#[derive(Default)]
pub struct MemoryCollection {
    inner: Mutex<HashMap<Vec<u8>, CacheEntry>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn lookup(&self, key: &[u8]) -> CacheLookup {
        let cache = self.inner.lock().await;
        match cache.get(key) {
            Some(entry) => {
                let lookup = entry.clone().into_lookup();
                if matches!(lookup, CacheLookup::Stale(_)) {
                    debug!("Cache STALE for key: {}", String::from_utf8_lossy(key));
                } else {
                    debug!("Cache HIT for key: {}", String::from_utf8_lossy(key));
                }
                lookup
            }
            None => {
                debug!("Cache MISS for key: {}", String::from_utf8_lossy(key));
                CacheLookup::Miss
            }
        }
    }

    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) {
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", String::from_utf8_lossy(key));
        cache.insert(key.to_vec(), CacheEntry::new(value, ttl));
    }

    async fn remove(&self, key: &[u8]) {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("Cache REMOVE for key: {}", String::from_utf8_lossy(key));
    }

    async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_cache_get_put() {
        let cache = MemoryCollection::new();

        // Initially, cache is empty
        assert!(cache.get(b"key1").await.is_none());

        cache.put(b"key1", b"123", None).await;

        assert_eq!(cache.get(b"key1").await, Some(b"123".to_vec()));
        assert!(cache.get(b"key2").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_expiration_keeps_stale_value() {
        let cache = MemoryCollection::new();

        cache
            .put(b"key1", b"123", Some(Duration::from_millis(10)))
            .await;
        assert_eq!(cache.lookup(b"key1").await, CacheLookup::Fresh(b"123".to_vec()));

        // Wait for TTL expiration
        sleep(Duration::from_millis(20)).await;
        assert!(cache.get(b"key1").await.is_none());
        assert_eq!(cache.lookup(b"key1").await, CacheLookup::Stale(b"123".to_vec()));
    }

    #[tokio::test]
    async fn test_cache_remove() {
        let cache = MemoryCollection::new();

        cache.put(b"key1", b"123", None).await;
        cache.remove(b"key1").await;
        assert_eq!(cache.lookup(b"key1").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = MemoryCollection::new();

        cache.put(b"key1", b"123", None).await;
        cache.put(b"key2", b"456", None).await;

        cache.clear().await;

        assert!(cache.get(b"key1").await.is_none());
        assert!(cache.get(b"key2").await.is_none());
    }
}
