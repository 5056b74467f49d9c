//! Request auditing: checkpoint timing, durable logging, and read-only
//! aggregate projections.
//!
//! Persistence is fire-and-forget relative to the response path. A failed
//! audit write is logged and swallowed — audit never affects whether the
//! request itself succeeds.

pub mod recorder;
pub mod stats;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Role;

pub use recorder::{AuditRecorder, AuditRequest, RequestTracker};
pub use stats::{DailyMetrics, QueryStats};

/// Checkpoint name for the natural-language-to-query translation interval.
pub const CHECKPOINT_GENERATION: &str = "queryGeneration";
/// Checkpoint name for the database execution interval.
pub const CHECKPOINT_EXECUTION: &str = "queryExecution";

/// Terminal status of an audited request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Success,
    Error,
}

/// Sub-operation timing for one request, all in whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceBreakdown {
    pub total_duration_ms: u64,
    pub query_generation_ms: u64,
    pub query_execution_ms: u64,
    pub token_count: u64,
}

/// How the request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub role: Role,
    pub status: QueryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// One completed interaction, written once and never mutated. Retention is
/// an external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub subject_id: String,
    pub timestamp: DateTime<Utc>,
    pub natural_language_query: String,
    /// Opaque resolved query as produced by the translator collaborator.
    pub resolved_query: Value,
    pub collection: String,
    pub performance: PerformanceBreakdown,
    pub outcome: Outcome,
}
