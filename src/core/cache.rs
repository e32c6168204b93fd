//! Key-value cache abstractions with expiry metadata

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Result of looking up a key in a collection.
///
/// Expired entries are kept around so callers can serve them while a refresh
/// is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Fresh(Vec<u8>),
    Stale(Vec<u8>),
    Miss,
}

impl CacheLookup {
    pub fn into_fresh(self) -> Option<Vec<u8>> {
        match self {
            CacheLookup::Fresh(v) => Some(v),
            _ => None,
        }
    }
}

/// Serialized envelope stored by every collection backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    pub expires_at: Option<SystemTime>,
}

impl CacheEntry {
    /// A ttl too large to represent as a point in time never expires.
    pub fn new(value: &[u8], ttl: Option<Duration>) -> Self {
        Self {
            value: value.to_vec(),
            expires_at: ttl.and_then(|d| SystemTime::now().checked_add(d)),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| SystemTime::now() >= expires_at)
    }

    pub fn into_lookup(self) -> CacheLookup {
        if self.is_expired() {
            CacheLookup::Stale(self.value)
        } else {
            CacheLookup::Fresh(self.value)
        }
    }
}

#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn lookup(&self, key: &[u8]) -> CacheLookup;

    /// Returns the value only if it has not expired.
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.lookup(key).await.into_fresh()
    }

    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>);
    async fn remove(&self, key: &[u8]);
    async fn clear(&self);
}

pub trait Store: Send + Sync {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = CacheEntry::new(b"value", None);
        assert!(!entry.is_expired());
        assert_eq!(entry.into_lookup(), CacheLookup::Fresh(b"value".to_vec()));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let entry = CacheEntry::new(b"value", Some(Duration::from_secs(u64::MAX)));
        assert_eq!(entry.expires_at, None);
        assert_eq!(entry.into_lookup(), CacheLookup::Fresh(b"value".to_vec()));

        let entry = CacheEntry::new(b"value", Some(Duration::from_secs(60)));
        assert!(entry.expires_at.is_some());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expired_entry_is_stale() {
        let entry = CacheEntry {
            value: b"value".to_vec(),
            expires_at: Some(SystemTime::now() - Duration::from_secs(1)),
        };
        assert!(entry.is_expired());
        assert_eq!(entry.into_lookup(), CacheLookup::Stale(b"value".to_vec()));
    }

    #[test]
    fn test_into_fresh_discards_stale() {
        assert_eq!(CacheLookup::Stale(vec![1]).into_fresh(), None);
        assert_eq!(CacheLookup::Miss.into_fresh(), None);
        assert_eq!(CacheLookup::Fresh(vec![1]).into_fresh(), Some(vec![1]));
    }
}
