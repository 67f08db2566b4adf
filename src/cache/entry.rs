//! Cache Entry Module
//!
//! Defines grouped cache entries and the TTL sanitization rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::MAX_TTL_SECONDS;

// == Cache Entry ==
/// A stored value together with its group and expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Caller-facing key (before canonicalization)
    pub key: String,
    /// Group the entry belongs to
    pub group: String,
    /// The stored payload
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry created at `now_ms` living for `ttl_seconds`.
    ///
    /// `None` means the entry never expires.
    pub fn new(
        key: impl Into<String>,
        group: impl Into<String>,
        value: Value,
        now_ms: u64,
        ttl_seconds: Option<u64>,
    ) -> Self {
        Self {
            key: key.into(),
            group: group.into(),
            value,
            created_at: now_ms,
            expires_at: ttl_seconds.map(|ttl| now_ms.saturating_add(ttl.saturating_mul(1000))),
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now_ms >= expires_at`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining TTL in milliseconds, `Some(0)` once expired, None without expiry.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now_ms))
    }

    /// Remaining TTL in whole seconds.
    pub fn ttl_remaining(&self, now_ms: u64) -> Option<u64> {
        self.ttl_remaining_ms(now_ms).map(|ms| ms / 1000)
    }

    /// Approximate payload size in bytes (serialized value plus key).
    pub fn approx_size(&self) -> usize {
        self.key.len() + self.group.len() + value_size(&self.value)
    }
}

/// Serialized byte length of a JSON value, escapes included.
pub fn value_size(value: &Value) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0)
}

// == TTL Sanitization ==
/// Turns a caller-supplied TTL into an effective one.
///
/// - `None` or a negative value falls back to `default_ttl`
/// - `0` means "never expires"
/// - anything above [`MAX_TTL_SECONDS`] is clamped
pub fn sanitize_ttl(ttl: Option<i64>, default_ttl: u64) -> Option<u64> {
    let secs = match ttl {
        Some(t) if t >= 0 => t as u64,
        _ => default_ttl,
    };

    if secs == 0 {
        None
    } else {
        Some(secs.min(MAX_TTL_SECONDS))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: u64 = 1_700_000_000_000;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("color", "theme", json!("#ff0000"), NOW, None);

        assert_eq!(entry.value, json!("#ff0000"));
        assert_eq!(entry.group, "theme");
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired_at(NOW + 10_000_000));
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new("color", "theme", json!("#ff0000"), NOW, Some(60));

        assert_eq!(entry.expires_at, Some(NOW + 60_000));
        assert!(!entry.is_expired_at(NOW + 59_999));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("k", "g", json!(1), NOW, Some(60));

        assert!(entry.is_expired_at(NOW + 60_000), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(NOW + 61_000));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("k", "g", json!(1), NOW, Some(10));

        assert_eq!(entry.ttl_remaining_ms(NOW + 500), Some(9_500));
        assert_eq!(entry.ttl_remaining(NOW + 500), Some(9));
        assert_eq!(entry.ttl_remaining(NOW + 20_000), Some(0));
    }

    #[test]
    fn test_ttl_remaining_no_expiration() {
        let entry = CacheEntry::new("k", "g", json!(1), NOW, None);
        assert!(entry.ttl_remaining(NOW).is_none());
    }

    #[test]
    fn test_sanitize_ttl() {
        assert_eq!(sanitize_ttl(None, 300), Some(300));
        assert_eq!(sanitize_ttl(Some(-5), 300), Some(300));
        assert_eq!(sanitize_ttl(Some(0), 300), None);
        assert_eq!(sanitize_ttl(Some(60), 300), Some(60));
        assert_eq!(sanitize_ttl(Some(i64::MAX), 300), Some(MAX_TTL_SECONDS));
        assert_eq!(sanitize_ttl(None, 0), None);
    }

    #[test]
    fn test_value_size_counts_escapes() {
        assert_eq!(value_size(&json!("abc")), 5);
        // each quote serializes as \"
        assert_eq!(value_size(&json!("\"".repeat(10))), 22);
        assert_eq!(value_size(&json!("a\nb")), 6);
        assert_eq!(value_size(&json!({"k": [1, 2]})), r#"{"k":[1,2]}"#.len());
    }

    #[test]
    fn test_approx_size_counts_payload() {
        let small = CacheEntry::new("k", "g", json!("a"), NOW, None);
        let large = CacheEntry::new("k", "g", json!("a".repeat(100)), NOW, None);
        assert!(large.approx_size() > small.approx_size());
    }
}
