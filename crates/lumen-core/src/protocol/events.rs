//! Push event payloads.
//!
//! Push channels carry bare payloads (no envelope). The structs are lenient:
//! missing optional fields default and unknown fields are kept in `extra`, so
//! a newer backend does not break an older front end.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Health of the backing engine process (`engine:status`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// e.g. "starting", "ready", "degraded", "stopped".
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One appended engine log line (`engine:log`, `engine:logs:recent`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Indexing queue progress (`engine:queue`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueProgress {
    pub pending: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
