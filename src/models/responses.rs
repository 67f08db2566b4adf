//! Response DTOs for the cache service API
//!
//! Every body is wrapped in [`ApiResponse`]:
//! `{success, data | message, meta: {timestamp, execution_time_ms, memory_usage, request_id}}`.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheMetrics;

// == Envelope ==
/// Per-response metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub execution_time_ms: f64,
    /// Approximate bytes held by the cache
    pub memory_usage: usize,
    pub request_id: String,
}

impl ResponseMeta {
    /// Builds metadata for a request that started at `started`.
    pub fn new(started: Instant, memory_usage: usize) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            memory_usage,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Metadata for responses produced outside a handler's timing scope.
    pub fn untimed() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: 0.0,
            memory_usage: 0,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Response envelope shared by all endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, meta: ResponseMeta) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta,
        }
    }

    /// A body carrying data but reporting `success: false`.
    pub fn unsuccessful(data: T, message: impl Into<String>, meta: ResponseMeta) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message.into()),
            meta,
        }
    }
}

impl ApiResponse<()> {
    /// Error body; used by the `CacheError` response conversion.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            meta: ResponseMeta::untimed(),
        }
    }
}

// == Payloads ==
/// Data for GET /get/:group/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetData {
    pub key: String,
    pub group: String,
    pub value: Value,
}

/// Data for PUT /set
#[derive(Debug, Clone, Serialize)]
pub struct SetData {
    pub key: String,
    pub group: String,
    pub message: String,
}

impl SetData {
    pub fn new(key: impl Into<String>, group: impl Into<String>) -> Self {
        let key = key.into();
        let group = group.into();
        Self {
            message: format!("Key '{}' set in group '{}'", key, group),
            key,
            group,
        }
    }
}

/// Data for DELETE /del/:group/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteData {
    pub key: String,
    pub group: String,
    /// Whether an entry existed and was removed
    pub deleted: bool,
}

/// Data for POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearData {
    /// None when every group was cleared
    pub group: Option<String>,
    pub removed: usize,
}

/// Data for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsData {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub generations: u64,
    pub avg_generation_ms: f64,
    pub hit_rate: f64,
    pub total_entries: usize,
    pub memory_usage: usize,
}

impl StatsData {
    pub fn from_metrics(metrics: &CacheMetrics, memory_usage: usize) -> Self {
        Self {
            hits: metrics.hits,
            misses: metrics.misses,
            sets: metrics.sets,
            deletes: metrics.deletes,
            evictions: metrics.evictions,
            expirations: metrics.expirations,
            generations: metrics.generations,
            avg_generation_ms: metrics.avg_generation_ms(),
            hit_rate: metrics.hit_rate(),
            total_entries: metrics.total_entries,
            memory_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_envelope_shape() {
        let resp = ApiResponse::ok(SetData::new("color", "theme"), ResponseMeta::new(Instant::now(), 42));
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["success"], json!(true));
        assert_eq!(json["data"]["key"], json!("color"));
        assert!(json.get("message").is_none());
        assert_eq!(json["meta"]["memory_usage"], json!(42));
        assert!(json["meta"]["execution_time_ms"].is_number());
        assert_eq!(json["meta"]["request_id"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::failure("Key not found: color")).unwrap();

        assert_eq!(json["success"], json!(false));
        assert_eq!(json["message"], json!("Key not found: color"));
        assert!(json.get("data").is_none());
        assert!(json["meta"]["timestamp"].is_string());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = ResponseMeta::untimed();
        let b = ResponseMeta::untimed();
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_stats_from_metrics() {
        let mut metrics = CacheMetrics::new();
        for _ in 0..8 {
            metrics.record_hit();
        }
        metrics.record_miss();
        metrics.record_miss();

        let stats = StatsData::from_metrics(&metrics, 0);
        assert!((stats.hit_rate - 0.8).abs() < 0.001);
    }
}
