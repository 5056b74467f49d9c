//! Document-store seam.
//!
//! The gateway never talks to a storage engine directly; everything it needs
//! (collection stats, index catalogs, explain plans, query execution, and the
//! audit/explanation collections) goes through [`DocumentStore`]. Production
//! wires a real driver behind this trait; tests use the in-memory mock.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit::AuditLogEntry;
use crate::explain::QueryExplanationRecord;

#[cfg(test)]
pub(crate) mod mock;

/// One index from a collection's catalog.
///
/// `key` preserves the index key specification in declaration order
/// (field name, direction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub key: Vec<(String, i32)>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub sparse: bool,
    #[serde(default)]
    pub background: bool,
}

impl IndexInfo {
    /// Field names of the key spec, without directions.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.key.iter().map(|(f, _)| f.as_str())
    }
}

/// A previously explained query, as returned for similarity lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastQuery {
    pub text: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Trait abstracting the document store the gateway fronts.
///
/// Query execution (`find`/`aggregate`) is included for completeness — the
/// gateway core only introspects queries, but request handlers reach the
/// engine through the same seam.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ========================================================================
    // Introspection
    // ========================================================================

    /// Total document count for a collection.
    async fn count_documents(&self, collection: &str) -> Result<u64>;

    /// The collection's index catalog.
    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexInfo>>;

    /// Execution-stats explain plan for a resolved query.
    ///
    /// Expected shape: `queryPlanner.winningPlan` as a nested stage tree
    /// linked by `inputStage`, plus top-level `executionStats` with
    /// `nReturned` and `totalDocsExamined`.
    async fn explain(&self, collection: &str, query: &Value) -> Result<Value>;

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run a find-style query.
    async fn find(&self, collection: &str, query: &Value) -> Result<Vec<Value>>;

    /// Run an aggregation pipeline.
    async fn aggregate(&self, collection: &str, pipeline: &[Value]) -> Result<Vec<Value>>;

    // ========================================================================
    // Audit log
    // ========================================================================

    /// Append one audit entry. Append-only; entries are never mutated.
    async fn append_audit_entry(&self, entry: &AuditLogEntry) -> Result<()>;

    /// All stored audit entries, oldest first.
    async fn list_audit_entries(&self) -> Result<Vec<AuditLogEntry>>;

    // ========================================================================
    // Explanation records
    // ========================================================================

    /// Persist one explanation record.
    async fn append_explanation(&self, record: &QueryExplanationRecord) -> Result<()>;

    /// Up to `limit` most-recent past queries (any collection), newest first.
    async fn recent_explanations(&self, limit: usize) -> Result<Vec<PastQuery>>;
}
