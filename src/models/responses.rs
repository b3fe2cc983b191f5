//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheStats, EntryMetadata};
use crate::metrics::MetricsSnapshot;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Entries evicted to make room
    pub evicted: usize,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, evicted: usize) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            evicted,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for GET /exists/:key
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub exists: bool,
}

/// Response body for GET /meta/:key
#[derive(Debug, Clone, Serialize)]
pub struct MetaResponse {
    pub key: String,
    pub created_at: Option<String>,
    pub last_accessed_at: Option<String>,
    /// None when the entry never expires
    pub expires_at: Option<String>,
    pub access_count: u64,
    pub size_bytes: usize,
    pub ttl_remaining_ms: Option<u64>,
}

impl MetaResponse {
    /// Builds the response, rendering Unix-millisecond timestamps as RFC 3339.
    pub fn new(key: impl Into<String>, meta: EntryMetadata) -> Self {
        Self {
            key: key.into(),
            created_at: rfc3339(meta.created_at),
            last_accessed_at: rfc3339(meta.last_accessed_at),
            expires_at: meta.expires_at.and_then(rfc3339),
            access_count: meta.access_count,
            size_bytes: meta.size_bytes,
            ttl_remaining_ms: meta.ttl_remaining_ms,
        }
    }
}

fn rfc3339(ms: u64) -> Option<String> {
    let ms = i64::try_from(ms).ok()?;
    DateTime::<Utc>::from_timestamp_millis(ms).map(|ts| ts.to_rfc3339())
}

/// Response body for POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for POST /cleanup
#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    /// Expired entries removed by this sweep
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Snapshot of resident entries from the engine
    pub cache: CacheStats,
    /// Request-level counters kept by the server
    pub requests: MetricsSnapshot,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", "test_value");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("test_value"));
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key", 1);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["key"], "my_key");
        assert_eq!(json["evicted"], 1);
        assert!(json["message"].as_str().unwrap().contains("successfully"));
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_meta_response_timestamps() {
        let meta = EntryMetadata {
            created_at: 0,
            last_accessed_at: 1_000,
            expires_at: None,
            access_count: 3,
            size_bytes: 5,
            ttl_remaining_ms: None,
        };
        let resp = MetaResponse::new("k", meta);

        assert_eq!(resp.created_at.as_deref(), Some("1970-01-01T00:00:00+00:00"));
        assert_eq!(resp.last_accessed_at.as_deref(), Some("1970-01-01T00:00:01+00:00"));
        assert!(resp.expires_at.is_none());
        assert_eq!(resp.access_count, 3);
    }

    #[test]
    fn test_stats_response_serialize() {
        let resp = StatsResponse {
            cache: CacheStats {
                total_keys: 2,
                capacity: 10,
                size: 2,
                total_accesses: 4,
                hit_rate: 0.5,
                total_size_bytes: 7,
            },
            requests: crate::metrics::ServerMetrics::new().snapshot(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["cache"]["total_keys"], 2);
        assert_eq!(json["cache"]["hit_rate"], 0.5);
        assert_eq!(json["requests"]["hits"], 0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
