//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::api::extract::ApiJson;
use crate::cache::{CacheBackend, CacheStore};
use crate::config::Config;
use crate::diagnostics::{run_cache_self_check, ReportDocument};
use crate::error::{CacheError, Result};
use crate::models::{
    ApiResponse, ClearData, ClearRequest, DeleteData, GetData, ResponseMeta, SetData, SetRequest,
    StatsData,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<CacheStore>>,
    /// Minimum self-check score for a healthy /health response
    pub health_threshold: f64,
}

impl AppState {
    /// Creates a new AppState with the given cache store.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            health_threshold: Config::default().health_threshold,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheStore::new(config.max_entries, config.default_ttl)
            .with_key_prefix(config.key_prefix.clone());
        Self::new(cache).with_health_threshold(config.health_threshold)
    }

    /// Same as [`from_config`](Self::from_config) with an external cache layer.
    pub fn from_config_with_backend(config: &Config, backend: Arc<dyn CacheBackend>) -> Self {
        let cache = CacheStore::new(config.max_entries, config.default_ttl)
            .with_key_prefix(config.key_prefix.clone())
            .with_backend(backend);
        Self::new(cache).with_health_threshold(config.health_threshold)
    }

    pub fn with_health_threshold(mut self, threshold: f64) -> Self {
        self.health_threshold = threshold;
        self
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SetRequest>,
) -> Result<Json<ApiResponse<SetData>>> {
    let started = Instant::now();
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    cache.set(&req.key, req.value, req.ttl, &req.group)?;

    let meta = ResponseMeta::new(started, cache.memory_usage());
    Ok(Json(ApiResponse::ok(SetData::new(req.key, req.group), meta)))
}

/// Handler for GET /get/:group/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<Json<ApiResponse<GetData>>> {
    let started = Instant::now();

    // Write lock: lookups update LRU order and metrics
    let mut cache = state.cache.write().await;
    let value = cache
        .get(&key, &group)
        .ok_or_else(|| CacheError::NotFound(format!("{}/{}", group, key)))?;

    let meta = ResponseMeta::new(started, cache.memory_usage());
    Ok(Json(ApiResponse::ok(GetData { key, group, value }, meta)))
}

/// Handler for DELETE /del/:group/:key
///
/// Idempotent: deleting a missing key still succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DeleteData>>> {
    let started = Instant::now();

    let mut cache = state.cache.write().await;
    let deleted = cache.delete(&key, &group)?;
    debug!("Delete {}/{} removed={}", group, key, deleted);

    let meta = ResponseMeta::new(started, cache.memory_usage());
    Ok(Json(ApiResponse::ok(DeleteData { key, group, deleted }, meta)))
}

/// Handler for POST /clear
pub async fn clear_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ClearRequest>,
) -> Json<ApiResponse<ClearData>> {
    let started = Instant::now();

    let mut cache = state.cache.write().await;
    let removed = cache.clear(req.group.as_deref());

    let meta = ResponseMeta::new(started, cache.memory_usage());
    Json(ApiResponse::ok(
        ClearData {
            group: req.group,
            removed,
        },
        meta,
    ))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<ApiResponse<StatsData>> {
    let started = Instant::now();

    let cache = state.cache.read().await;
    let memory_usage = cache.memory_usage();
    let stats = StatsData::from_metrics(&cache.metrics(), memory_usage);

    Json(ApiResponse::ok(stats, ResponseMeta::new(started, memory_usage)))
}

/// Handler for GET /health
///
/// Runs the cache self-check suite. Below the threshold the report is still
/// returned, with `success: false` and status 503.
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<ReportDocument>>) {
    let started = Instant::now();
    let report = run_cache_self_check(state.health_threshold);
    let memory_usage = state.cache.read().await.memory_usage();
    let meta = ResponseMeta::new(started, memory_usage);

    if report.is_success() {
        (StatusCode::OK, Json(ApiResponse::ok(report.document(), meta)))
    } else {
        let message = format!(
            "Self-check score {:.1}% is below threshold {:.1}%",
            report.score(),
            report.threshold()
        );
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::unsuccessful(report.document(), message, meta)),
        )
    }
}
