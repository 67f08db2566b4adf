//! Cache Metrics Module
//!
//! Tracks lookups, writes, removals and value-generation timing.

use serde::Serialize;

// == Cache Metrics ==
/// Counters collected by the cache store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheMetrics {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Successful writes
    pub sets: u64,
    /// Deletes that actually removed an entry
    pub deletes: u64,
    /// Entries dropped by the LRU bound
    pub evictions: u64,
    /// Entries purged because their TTL elapsed
    pub expirations: u64,
    /// Successful `remember`/warm-up callback runs
    pub generations: u64,
    /// Total time spent inside those callbacks (milliseconds)
    pub total_generation_ms: f64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Average Generation Time ==
    /// Mean callback duration in milliseconds, 0.0 before the first run.
    pub fn avg_generation_ms(&self) -> f64 {
        if self.generations == 0 {
            0.0
        } else {
            self.total_generation_ms / self.generations as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    // == Record Generation ==
    /// Adds one callback run of `elapsed_ms`.
    pub fn record_generation(&mut self, elapsed_ms: f64) {
        self.generations += 1;
        self.total_generation_ms += elapsed_ms;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
