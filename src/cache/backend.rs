//! Cache Backend Module
//!
//! The optional external layer behind the in-process store. The store reads
//! through it on a local miss and writes through it on every mutation.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == Backend Trait ==
/// An external key-value layer addressed by canonical keys.
pub trait CacheBackend: Debug + Send + Sync {
    fn get(&self, canonical_key: &str) -> Result<Option<CacheEntry>>;

    fn set(&self, canonical_key: &str, entry: &CacheEntry) -> Result<()>;

    fn delete(&self, canonical_key: &str) -> Result<()>;

    /// Removes every entry tagged with `group`, returning how many went.
    fn flush_group(&self, group: &str) -> Result<usize>;

    fn flush(&self) -> Result<()>;

    /// Drops entries that are expired at `now_ms`, returning how many went.
    fn purge_expired(&self, now_ms: u64) -> Result<usize>;
}

// == Memory Backend ==
/// A shared in-memory backend.
///
/// Clones see the same data, which lets two stores share one layer the way
/// separate requests share an object cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Backend("memory backend lock poisoned".to_string())
}

impl CacheBackend for MemoryBackend {
    fn get(&self, canonical_key: &str) -> Result<Option<CacheEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(canonical_key).cloned())
    }

    fn set(&self, canonical_key: &str, entry: &CacheEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(canonical_key.to_string(), entry.clone());
        Ok(())
    }

    fn delete(&self, canonical_key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(canonical_key);
        Ok(())
    }

    fn flush_group(&self, group: &str) -> Result<usize> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| entry.group != group);
        Ok(before - entries.len())
    }

    fn flush(&self) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.clear();
        Ok(())
    }

    fn purge_expired(&self, now_ms: u64) -> Result<usize> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now_ms));
        Ok(before - entries.len())
    }
}
