pub mod disk;
pub mod memory;

use crate::core::cache::{KeyValueCollection, Store};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions, PersistMode};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::debug;

/// A thread-safe key-value store that can hold multiple collections.
///
/// Persistent collections live in a fjall keyspace under `<data>/cache`. When
/// the keyspace cannot be opened every collection is kept in memory instead.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Keyspace>,
}

impl KeyValueStore {
    pub fn new(data_path: Option<&Path>) -> Self {
        let keyspace = data_path.and_then(|path| {
            let cache_dir = path.join("cache");
            match fjall::Config::new(&cache_dir).open() {
                Ok(keyspace) => Some(keyspace),
                Err(e) => {
                    debug!("Could not open cache at {}: {}", cache_dir.display(), e);
                    None
                }
            }
        });

        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }

    /// Syncs persistent collections to disk.
    pub fn flush(&self) {
        if let Some(keyspace) = &self.keyspace {
            if let Err(e) = keyspace.persist(PersistMode::SyncAll) {
                debug!("Failed to persist cache: {}", e);
            }
        }
    }

    fn create_collection(&self, name: &str, persist: bool) -> Arc<dyn KeyValueCollection> {
        if persist {
            if let Some(keyspace) = &self.keyspace {
                match keyspace.open_partition(name, PartitionCreateOptions::default()) {
                    Ok(partition) => return Arc::new(DiskCollection::new(partition)),
                    Err(e) => debug!("Could not open partition {}: {}", name, e),
                }
            }
        }
        Arc::new(MemoryCollection::new())
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Store for KeyValueStore {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>> {
        if let Some(collection) = self
            .collections
            .read()
            .ok()
            .and_then(|c| c.get(name).cloned())
        {
            return Some(collection);
        }
        if !create_if_missing {
            return None;
        }

        let mut collections = self.collections.write().ok()?;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| self.create_collection(name, persist));
        Some(Arc::clone(collection))
    }
}
