//! Per-request timing tracker and the audit recorder.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use super::{
    AuditLogEntry, Outcome, PerformanceBreakdown, QueryStatus, CHECKPOINT_EXECUTION,
    CHECKPOINT_GENERATION,
};
use crate::auth::Role;
use crate::store::DocumentStore;

/// Tracks elapsed time between named checkpoints of a single request.
///
/// Checkpoints are independent named points; nothing requires them to be
/// recorded in any particular order.
#[derive(Debug)]
pub struct RequestTracker {
    started_at: Instant,
    checkpoints: HashMap<String, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            checkpoints: HashMap::new(),
        }
    }

    /// Reset the start timestamp and drop all checkpoints.
    pub fn start_tracking(&mut self) {
        self.started_at = Instant::now();
        self.checkpoints.clear();
    }

    /// Record elapsed milliseconds since start under `name`. Re-marking a
    /// name overwrites the earlier value.
    pub fn mark_checkpoint(&mut self, name: &str) {
        let elapsed = self.started_at.elapsed().as_millis() as u64;
        self.checkpoints.insert(name.to_string(), elapsed);
    }

    /// Elapsed milliseconds at the named checkpoint, if marked.
    pub fn checkpoint(&self, name: &str) -> Option<u64> {
        self.checkpoints.get(name).copied()
    }

    /// Milliseconds since start.
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Start → "queryGeneration", or 0 if the checkpoint is absent.
    fn query_generation_ms(&self) -> u64 {
        self.checkpoint(CHECKPOINT_GENERATION).unwrap_or(0)
    }

    /// "queryGeneration" → "queryExecution", or 0 if either is absent.
    fn query_execution_ms(&self) -> u64 {
        match (
            self.checkpoint(CHECKPOINT_GENERATION),
            self.checkpoint(CHECKPOINT_EXECUTION),
        ) {
            (Some(generation), Some(execution)) => execution.saturating_sub(generation),
            _ => 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_checkpoint_ms(&mut self, name: &str, elapsed_ms: u64) {
        self.checkpoints.insert(name.to_string(), elapsed_ms);
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything `log_query` needs beyond the tracker.
pub struct AuditRequest<'a> {
    pub subject_id: &'a str,
    pub role: Role,
    pub natural_language_query: &'a str,
    pub resolved_query: &'a Value,
    pub collection: &'a str,
    pub token_count: u64,
    /// Some(detail) marks the outcome as an error.
    pub error: Option<String>,
}

/// Builds audit entries and persists them off the response path.
pub struct AuditRecorder {
    store: Arc<dyn DocumentStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fresh tracker for one request.
    pub fn start_tracking(&self) -> RequestTracker {
        RequestTracker::new()
    }

    pub(crate) fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Compose the audit entry for a completed request and persist it in the
    /// background. Returns the entry as built; the caller must not wait on
    /// the write. Persistence failures are logged and swallowed.
    pub fn log_query(&self, tracker: &RequestTracker, request: AuditRequest<'_>) -> AuditLogEntry {
        let (status, error_detail) = match request.error {
            Some(detail) => (QueryStatus::Error, Some(detail)),
            None => (QueryStatus::Success, None),
        };

        let entry = AuditLogEntry {
            subject_id: request.subject_id.to_string(),
            timestamp: Utc::now(),
            natural_language_query: request.natural_language_query.to_string(),
            resolved_query: request.resolved_query.clone(),
            collection: request.collection.to_string(),
            performance: PerformanceBreakdown {
                total_duration_ms: tracker.elapsed_ms(),
                query_generation_ms: tracker.query_generation_ms(),
                query_execution_ms: tracker.query_execution_ms(),
                token_count: request.token_count,
            },
            outcome: Outcome {
                role: request.role,
                status,
                error_detail,
            },
        };

        let store = self.store.clone();
        let persisted = entry.clone();
        tokio::spawn(async move {
            if let Err(e) = store.append_audit_entry(&persisted).await {
                warn!(
                    subject_id = %persisted.subject_id,
                    collection = %persisted.collection,
                    error = %e,
                    "audit write failed; entry dropped"
                );
            }
        });

        entry
    }
}

// ============================================================================
// Tests
// ============================================================================
