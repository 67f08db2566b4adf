//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::DEFAULT_GROUP;

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

/// Request body for PUT /set
///
/// # Fields
/// - `key`: The cache key
/// - `value`: Any JSON payload
/// - `ttl`: Optional TTL in seconds; negative or missing uses the default, 0 never expires
/// - `group`: Optional group, `default` when omitted
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default = "default_group")]
    pub group: String,
}

impl SetRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.trim().is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /clear. No group clears everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub group: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_defaults() {
        let json = r##"{"key": "color", "value": "#ff0000"}"##;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "color");
        assert_eq!(req.value, json!("#ff0000"));
        assert!(req.ttl.is_none());
        assert_eq!(req.group, "default");
    }

    #[test]
    fn test_set_request_full() {
        let json = r#"{"key": "menu", "value": {"width": 160}, "ttl": -1, "group": "theme"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(-1));
        assert_eq!(req.group, "theme");
        assert_eq!(req.value["width"], json!(160));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "   ".to_string(),
            value: json!(1),
            ttl: None,
            group: default_group(),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_clear_request_optional_group() {
        let req: ClearRequest = serde_json::from_str("{}").unwrap();
        assert!(req.group.is_none());

        let req: ClearRequest = serde_json::from_str(r#"{"group":"theme"}"#).unwrap();
        assert_eq!(req.group.as_deref(), Some("theme"));
    }
}
