//! Cache Store Module
//!
//! The cache façade: grouped TTL storage with lazy expiry, LRU bounding,
//! get-or-compute, bulk warm-up and an optional external layer.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::entry::{sanitize_ttl, value_size};
use crate::cache::key::normalize_group;
use crate::cache::{
    CacheBackend, CacheEntry, CacheMetrics, Clock, KeyBuilder, LruTracker, SystemClock,
    MAX_VALUE_SIZE,
};
use crate::error::{CacheError, Result};

// == Warm Up Outcome ==
/// Per-key result of [`CacheStore::warm_up`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmUpOutcome {
    pub success: bool,
    /// Time spent computing and storing the value
    pub time_taken_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// == Cache Store ==
/// Grouped TTL cache.
#[derive(Debug)]
pub struct CacheStore {
    /// Canonical key -> entry
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    metrics: CacheMetrics,
    keys: KeyBuilder,
    clock: Arc<dyn Clock>,
    backend: Option<Arc<dyn CacheBackend>>,
    /// Maximum number of entries held in process
    max_entries: usize,
    /// TTL in seconds used when the caller gives none
    default_ttl: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store on the system clock with no external layer.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of in-process entries (at least 1)
    /// * `default_ttl` - TTL in seconds for writes without one; 0 = never expire
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            metrics: CacheMetrics::new(),
            keys: KeyBuilder::default(),
            clock: Arc::new(SystemClock),
            backend: None,
            max_entries: max_entries.max(1),
            default_ttl,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.keys = KeyBuilder::new(prefix);
        self
    }

    // == Get ==
    /// Returns the live value for `key` in `group`.
    ///
    /// An expired local entry is purged and the external layer, if any, is
    /// consulted before the lookup counts as a miss. An expired copy found
    /// there is deleted as well.
    pub fn get(&mut self, key: &str, group: &str) -> Option<Value> {
        let canonical = match self.keys.build(key, group) {
            Ok(canonical) => canonical,
            Err(err) => {
                debug!("Lookup with unusable key treated as miss: {}", err);
                self.metrics.record_miss();
                return None;
            }
        };
        let now = self.clock.now_ms();

        match self.entries.get(&canonical) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                self.metrics.record_hit();
                self.lru.touch(&canonical);
                return Some(value);
            }
            Some(_) => {
                self.remove_local(&canonical);
                self.metrics.record_expirations(1);
            }
            None => {}
        }

        if let Some(entry) = self.backend_lookup(&canonical, now) {
            let value = entry.value.clone();
            self.insert_local(canonical, entry);
            self.metrics.record_hit();
            return Some(value);
        }

        self.metrics.record_miss();
        None
    }

    /// Like [`get`](Self::get) but falls back to `default`.
    pub fn get_or(&mut self, key: &str, group: &str, default: Value) -> Value {
        self.get(key, group).unwrap_or(default)
    }

    /// Whether a live entry exists locally. Does not touch metrics or LRU order.
    pub fn has(&self, key: &str, group: &str) -> bool {
        let now = self.clock.now_ms();
        self.keys
            .build(key, group)
            .ok()
            .and_then(|canonical| self.entries.get(&canonical))
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Set ==
    /// Stores `value` under `key` in `group`.
    ///
    /// `ttl` is sanitized: None or negative uses the default TTL, 0 never
    /// expires, and very large values are clamped. Overwrites reset the TTL.
    pub fn set(&mut self, key: &str, value: Value, ttl: Option<i64>, group: &str) -> Result<()> {
        let canonical = self.keys.build(key, group)?;

        let size = value_size(&value);
        if size > MAX_VALUE_SIZE {
            return Err(CacheError::ValueTooLarge(format!(
                "{} bytes exceeds maximum size of {} bytes",
                size, MAX_VALUE_SIZE
            )));
        }

        let group = normalize_group(group);
        let ttl = sanitize_ttl(ttl, self.default_ttl);
        let entry = CacheEntry::new(key, group, value, self.clock.now_ms(), ttl);

        if let Some(backend) = &self.backend {
            if let Err(err) = backend.set(&canonical, &entry) {
                warn!("Backend write failed for {}: {}", canonical, err);
            }
        }

        debug!("Cache set {} (ttl={:?})", canonical, ttl);
        self.insert_local(canonical, entry);
        self.metrics.record_set();
        Ok(())
    }

    // == Delete ==
    /// Removes `key` from `group`.
    ///
    /// Succeeds whether or not the key existed; the returned flag tells
    /// whether a local entry was actually removed.
    pub fn delete(&mut self, key: &str, group: &str) -> Result<bool> {
        let canonical = self.keys.build(key, group)?;

        if let Some(backend) = &self.backend {
            if let Err(err) = backend.delete(&canonical) {
                warn!("Backend delete failed for {}: {}", canonical, err);
            }
        }

        let removed = self.remove_local(&canonical).is_some();
        if removed {
            self.metrics.record_delete();
        }
        Ok(removed)
    }

    // == Remember ==
    /// Returns the cached value, or computes, stores and returns it.
    ///
    /// `compute` runs at most once per call and only on a miss. If it fails
    /// nothing is stored. Generation time is only recorded once the value
    /// has been stored.
    pub fn remember<F, E>(
        &mut self,
        key: &str,
        group: &str,
        ttl: Option<i64>,
        compute: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> std::result::Result<Value, E>,
        E: Display,
    {
        self.keys.build(key, group)?;

        if let Some(value) = self.get(key, group) {
            return Ok(value);
        }

        let started = Instant::now();
        let value = compute().map_err(|err| CacheError::Generation(format!("{}: {}", key, err)))?;
        let generation_ms = elapsed_ms(started);

        self.set(key, value.clone(), ttl, group)?;
        self.metrics.record_generation(generation_ms);
        Ok(value)
    }

    // == Clear ==
    /// Removes every entry in `group`, or everything when `group` is None.
    ///
    /// Returns the number of local entries removed.
    pub fn clear(&mut self, group: Option<&str>) -> usize {
        match group {
            Some(group) => {
                let group = normalize_group(group);
                if let Some(backend) = &self.backend {
                    if let Err(err) = backend.flush_group(&group) {
                        warn!("Backend group flush failed for {}: {}", group, err);
                    }
                }

                let doomed: Vec<String> = self
                    .entries
                    .iter()
                    .filter(|(_, entry)| entry.group == group)
                    .map(|(canonical, _)| canonical.clone())
                    .collect();
                for canonical in &doomed {
                    self.remove_local(canonical);
                }

                info!("Cleared {} entries from group '{}'", doomed.len(), group);
                doomed.len()
            }
            None => {
                if let Some(backend) = &self.backend {
                    if let Err(err) = backend.flush() {
                        warn!("Backend flush failed: {}", err);
                    }
                }

                let count = self.entries.len();
                self.entries.clear();
                self.lru.clear();
                self.metrics.set_total_entries(0);

                info!("Cleared all {} entries", count);
                count
            }
        }
    }

    // == Warm Up ==
    /// Computes and stores each value eagerly.
    ///
    /// A failing key is recorded and the rest still run.
    pub fn warm_up<I, F, E>(
        &mut self,
        items: I,
        group: &str,
        ttl: Option<i64>,
    ) -> BTreeMap<String, WarmUpOutcome>
    where
        I: IntoIterator<Item = (String, F)>,
        F: FnOnce() -> std::result::Result<Value, E>,
        E: Display,
    {
        let mut outcomes = BTreeMap::new();

        for (key, compute) in items {
            let started = Instant::now();
            let result = match compute() {
                Ok(value) => {
                    let generation_ms = elapsed_ms(started);
                    let stored = self.set(&key, value, ttl, group);
                    if stored.is_ok() {
                        self.metrics.record_generation(generation_ms);
                    }
                    stored
                }
                Err(err) => Err(CacheError::Generation(format!("{}: {}", key, err))),
            };

            let outcome = WarmUpOutcome {
                success: result.is_ok(),
                time_taken_ms: elapsed_ms(started),
                error: result.err().map(|err| err.to_string()),
            };
            if let Some(err) = &outcome.error {
                warn!("Warm-up failed for {}: {}", key, err);
            }
            outcomes.insert(key, outcome);
        }

        let succeeded = outcomes.values().filter(|o| o.success).count();
        info!(
            "Warm-up of group '{}' finished: {}/{} succeeded",
            normalize_group(group),
            succeeded,
            outcomes.len()
        );
        outcomes
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many local ones went.
    ///
    /// Expired entries in the external layer are purged too.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        if let Some(backend) = &self.backend {
            match backend.purge_expired(now) {
                Ok(purged) if purged > 0 => debug!("Purged {} expired backend entries", purged),
                Ok(_) => {}
                Err(err) => warn!("Backend purge failed: {}", err),
            }
        }

        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(canonical, _)| canonical.clone())
            .collect();

        for canonical in &expired {
            self.remove_local(canonical);
        }

        self.metrics.record_expirations(expired.len());
        expired.len()
    }

    // == Metrics ==
    /// Returns a snapshot of the current metrics.
    pub fn metrics(&self) -> CacheMetrics {
        let mut metrics = self.metrics.clone();
        metrics.set_total_entries(self.entries.len());
        metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = CacheMetrics::new();
        self.metrics.set_total_entries(self.entries.len());
    }

    /// Approximate bytes held by local entries.
    pub fn memory_usage(&self) -> usize {
        self.entries.values().map(CacheEntry::approx_size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn key_builder(&self) -> &KeyBuilder {
        &self.keys
    }

    // == Internals ==
    fn insert_local(&mut self, canonical: String, entry: CacheEntry) {
        if !self.entries.contains_key(&canonical) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.metrics.record_eviction();
                debug!("Evicted least recently used entry {}", evicted);
            }
        }

        self.lru.touch(&canonical);
        self.entries.insert(canonical, entry);
        self.metrics.set_total_entries(self.entries.len());
    }

    fn remove_local(&mut self, canonical: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(canonical);
        self.lru.remove(canonical);
        self.metrics.set_total_entries(self.entries.len());
        removed
    }

    fn backend_lookup(&self, canonical: &str, now: u64) -> Option<CacheEntry> {
        let backend = self.backend.as_ref()?;
        match backend.get(canonical) {
            Ok(Some(entry)) if !entry.is_expired_at(now) => Some(entry),
            Ok(Some(_)) => {
                if let Err(err) = backend.delete(canonical) {
                    warn!("Backend delete of expired {} failed: {}", canonical, err);
                }
                None
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Backend read failed for {}: {}", canonical, err);
                None
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
