//! Key Builder Module
//!
//! Turns a (group, key) pair into the canonical key used for storage.

use sha2::{Digest, Sha256};

use crate::cache::{DEFAULT_GROUP, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Key Builder ==
/// Builds canonical keys of the form `{prefix}{group}:{key}`.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    prefix: String,
}

impl KeyBuilder {
    /// Prefixes are cut to leave room for a hashed key.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = normalize(&prefix.into());
        let mut limit = MAX_PREFIX_LENGTH.min(prefix.len());
        while !prefix.is_char_boundary(limit) {
            limit -= 1;
        }
        prefix.truncate(limit);
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // == Build ==
    /// Returns the canonical key for `key` inside `group`.
    ///
    /// Whitespace and control characters become `_`. The result never
    /// exceeds [`MAX_KEY_LENGTH`]:
    /// - `{prefix}{group}:{key}` when it fits
    /// - `{prefix}{group}:#{sha256(key)}` when only the key is too long
    /// - `{prefix}#{sha256(group:key)}` when the group is too long as well
    ///
    /// Keys or groups that already start with [`HASH_MARKER`] always take the
    /// hashed path, so a literal key can never look like a hashed one. An
    /// empty key is the only input that is rejected.
    pub fn build(&self, key: &str, group: &str) -> Result<String> {
        let key = normalize(key);
        if key.is_empty() {
            return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
        }

        let group = normalize_group(group);
        let marked = key.starts_with(HASH_MARKER) || group.starts_with(HASH_MARKER);

        let canonical = format!("{}{}:{}", self.prefix, group, key);
        if !marked && canonical.len() <= MAX_KEY_LENGTH {
            return Ok(canonical);
        }

        let group_scoped = format!(
            "{}{}:{}{}",
            self.prefix,
            group,
            HASH_MARKER,
            sha256_hex(key.as_bytes())
        );
        if !group.starts_with(HASH_MARKER) && group_scoped.len() <= MAX_KEY_LENGTH {
            return Ok(group_scoped);
        }

        let joined = format!("{}:{}", group, key);
        Ok(format!(
            "{}{}{}",
            self.prefix,
            HASH_MARKER,
            sha256_hex(joined.as_bytes())
        ))
    }
}

/// Marks the hashed part of a canonical key.
pub const HASH_MARKER: char = '#';

// marker + 64 hex chars must always fit after the prefix
const MAX_PREFIX_LENGTH: usize = MAX_KEY_LENGTH - 65;

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new(crate::cache::DEFAULT_KEY_PREFIX)
    }
}

/// Normalizes a group name; empty groups map to [`DEFAULT_GROUP`].
pub fn normalize_group(group: &str) -> String {
    let group = normalize(group);
    if group.is_empty() {
        DEFAULT_GROUP.to_string()
    } else {
        group
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_whitespace() || c.is_control() { '_' } else { c })
        .collect()
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_simple_key() {
        let builder = KeyBuilder::new("las_");
        assert_eq!(builder.build("color", "theme").unwrap(), "las_theme:color");
    }

    #[test]
    fn test_build_default_group() {
        let builder = KeyBuilder::new("las_");
        assert_eq!(builder.build("color", "").unwrap(), "las_default:color");
        assert_eq!(builder.build("color", "   ").unwrap(), "las_default:color");
    }

    #[test]
    fn test_build_normalizes_whitespace() {
        let builder = KeyBuilder::new("las_");
        assert_eq!(
            builder.build("  menu  width\n", "theme").unwrap(),
            "las_theme:menu__width"
        );
    }

    #[test]
    fn test_build_empty_key_rejected() {
        let builder = KeyBuilder::default();
        assert!(matches!(builder.build("", "theme"), Err(CacheError::InvalidKey(_))));
        assert!(matches!(builder.build(" \t ", "theme"), Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_build_hashes_long_keys() {
        let builder = KeyBuilder::new("las_");
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let canonical = builder.build(&long_key, "theme").unwrap();

        assert!(canonical.len() <= MAX_KEY_LENGTH);
        assert!(canonical.starts_with("las_theme:"));
        // marker + 64 hex chars of SHA-256
        assert_eq!(canonical.len(), "las_theme:#".len() + 64);
    }

    #[test]
    fn test_build_long_group_stays_bounded() {
        let builder = KeyBuilder::default();
        let group = "g".repeat(200);

        let long_key = builder.build(&"k".repeat(300), &group).unwrap();
        let short_key = builder.build("color", &group).unwrap();

        assert!(long_key.len() <= MAX_KEY_LENGTH, "len {}", long_key.len());
        assert!(short_key.len() <= MAX_KEY_LENGTH, "len {}", short_key.len());
        assert!(short_key.starts_with("las_#"));
        assert_ne!(long_key, short_key);
        assert_ne!(short_key, builder.build("color", &"g".repeat(201)).unwrap());
    }

    #[test]
    fn test_literal_hex_key_does_not_collide_with_hashed_key() {
        let builder = KeyBuilder::new("las_");
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
        let hashed = builder.build(&long_key, "theme").unwrap();
        let digest = hashed.trim_start_matches("las_theme:#").to_string();

        let as_plain = builder.build(&digest, "theme").unwrap();
        let as_marked = builder.build(&format!("#{}", digest), "theme").unwrap();

        assert_eq!(as_plain, format!("las_theme:{}", digest));
        assert_ne!(as_plain, hashed);
        assert_ne!(as_marked, hashed);
        assert!(as_marked.starts_with("las_theme:#"));
    }

    #[test]
    fn test_long_prefix_is_truncated() {
        let builder = KeyBuilder::new("p".repeat(500));
        let canonical = builder.build(&"k".repeat(500), &"g".repeat(500)).unwrap();

        assert!(builder.prefix().len() < MAX_KEY_LENGTH);
        assert!(canonical.len() <= MAX_KEY_LENGTH);
    }

    #[test]
    fn test_build_hash_is_stable_and_distinct() {
        let builder = KeyBuilder::default();
        let a = "a".repeat(500);
        let b = "b".repeat(500);

        assert_eq!(builder.build(&a, "g").unwrap(), builder.build(&a, "g").unwrap());
        assert_ne!(builder.build(&a, "g").unwrap(), builder.build(&b, "g").unwrap());
    }

    #[test]
    fn test_same_key_different_groups_differ() {
        let builder = KeyBuilder::default();
        assert_ne!(
            builder.build("color", "theme").unwrap(),
            builder.build("color", "menu").unwrap()
        );
    }
}
