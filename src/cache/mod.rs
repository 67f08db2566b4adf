//! Cache Module
//!
//! Grouped in-memory caching with TTL expiration, LRU bounding and an
//! optional external layer.

mod backend;
mod clock;
mod entry;
mod key;
mod lru;
mod metrics;
mod store;


// Re-export public types
pub use backend::{CacheBackend, MemoryBackend};
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{sanitize_ttl, CacheEntry};
pub use key::{normalize_group, KeyBuilder};
pub use lru::LruTracker;
pub use metrics::CacheMetrics;
pub use store::{CacheStore, WarmUpOutcome};

// == Public Constants ==
/// Maximum canonical key length in bytes; longer keys are hashed
pub const MAX_KEY_LENGTH: usize = 172;

/// Maximum allowed serialized value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Upper bound applied to caller-supplied TTLs (30 days)
pub const MAX_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Group used when none is given
pub const DEFAULT_GROUP: &str = "default";

/// Prefix prepended to every canonical key
pub const DEFAULT_KEY_PREFIX: &str = "las_";
