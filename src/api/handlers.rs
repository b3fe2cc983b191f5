//! API Handlers
//!
//! HTTP request handlers translating requests into cache engine operations.
//! Hit, miss and eviction outcomes are reported to [`ServerMetrics`] here,
//! where they are decided.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::metrics::ServerMetrics;
use crate::models::{
    CleanupResponse, ClearResponse, DeleteResponse, ExistsResponse, GetResponse, HealthResponse,
    MetaResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache engine does its own locking, so it is shared through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache engine
    pub cache: Arc<CacheStore>,
    /// Request-level counters
    pub metrics: Arc<ServerMetrics>,
    /// TTL applied when a set request carries none
    pub default_ttl: Option<Duration>,
}

impl AppState {
    /// Creates a new AppState with the given cache store and no default TTL.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: Arc::new(cache),
            metrics: Arc::new(ServerMetrics::new()),
            default_ttl: None,
        }
    }

    /// Sets the TTL applied to set requests without one.
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration does not validate.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let cache = CacheStore::with_options(
            config.capacity(),
            config.shard_count,
            Arc::new(crate::cache::SystemClock::new()),
        )?;
        Ok(Self::new(cache).with_default_ttl(config.default_ttl()))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache with optional TTL (seconds).
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs).or(state.default_ttl);
    let evicted = state.cache.set(&req.key, req.value, ttl);
    state.metrics.record_set(evicted);

    Ok(Json(SetResponse::new(req.key, evicted)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.cache.get(&key);
    state.metrics.record_get(value.is_some());

    match value {
        Some(bytes) => {
            let value = String::from_utf8_lossy(&bytes).into_owned();
            Ok(Json(GetResponse::new(key, value)))
        }
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.delete(&key) {
        return Err(CacheError::NotFound(key));
    }
    state.metrics.record_delete();

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /exists/:key
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ExistsResponse> {
    let exists = state.cache.exists(&key);
    Json(ExistsResponse { key, exists })
}

/// Handler for GET /meta/:key
///
/// Returns entry bookkeeping without counting as a read.
pub async fn meta_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MetaResponse>> {
    match state.cache.peek(&key) {
        Some(meta) => Ok(Json(MetaResponse::new(key, meta))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear();
    Json(ClearResponse::new())
}

/// Handler for POST /cleanup
///
/// Runs an expiration sweep immediately instead of waiting for the reaper.
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<CleanupResponse> {
    let removed = state.cache.cleanup();
    state.metrics.record_reaped(removed);
    Json(CleanupResponse { removed })
}

/// Handler for GET /stats
///
/// Returns engine statistics alongside request-level counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        cache: state.cache.stats(),
        requests: state.metrics.snapshot(),
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
