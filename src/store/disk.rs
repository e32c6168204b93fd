use crate::core::cache::{CacheEntry, CacheLookup, KeyValueCollection};
use anyhow::Result;
use async_trait::async_trait;
use fjall::PartitionHandle;
use std::time::Duration;
use tracing::debug;

/// Collection backed by a fjall partition, survives between runs.
pub struct DiskCollection {
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(partition: PartitionHandle) -> Self {
        Self { partition }
    }

    fn read_entry(&self, key: &[u8]) -> Result<Option<CacheEntry>> {
        match self.partition.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn lookup(&self, key: &[u8]) -> CacheLookup {
        match self.read_entry(key) {
            Ok(Some(entry)) => {
                let lookup = entry.into_lookup();
                if matches!(lookup, CacheLookup::Stale(_)) {
                    debug!("Cache STALE for key: {}", String::from_utf8_lossy(key));
                } else {
                    debug!("Cache HIT for key: {}", String::from_utf8_lossy(key));
                }
                lookup
            }
            Ok(None) => {
                debug!("Cache MISS for key: {}", String::from_utf8_lossy(key));
                CacheLookup::Miss
            }
            Err(e) => {
                debug!("DiskCollection get error: {}", e);
                CacheLookup::Miss
            }
        }
    }

    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) {
        let res: Result<()> = (|| {
            let entry = CacheEntry::new(value, ttl);
            self.partition.insert(key, serde_json::to_vec(&entry)?)?;
            debug!("Cache PUT for key: {}", String::from_utf8_lossy(key));
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskCollection put error: {}", e);
        }
    }

    async fn remove(&self, key: &[u8]) {
        if let Err(e) = self.partition.remove(key) {
            debug!("DiskCollection remove error: {}", e);
        }
    }

    async fn clear(&self) {
        let res: Result<()> = (|| {
            let keys = self
                .partition
                .keys()
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for key in keys {
                self.partition.remove(key)?;
            }
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskCollection clear error: {}", e);
        }
    }
}
