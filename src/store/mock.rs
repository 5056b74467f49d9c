//! In-memory mock implementation of DocumentStore for testing without a
//! real database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DocumentStore, IndexInfo, PastQuery};
use crate::audit::AuditLogEntry;
use crate::explain::QueryExplanationRecord;

/// In-memory mock store.
///
/// Collection stats, index catalogs, and explain responses are seeded by
/// tests; audit entries and explanation records accumulate in `Vec`s behind
/// async locks. Failure flags let tests exercise the soft-failure paths.
pub struct MockDocumentStore {
    document_counts: Mutex<HashMap<String, u64>>,
    indexes: Mutex<HashMap<String, Vec<IndexInfo>>>,
    explain_responses: Mutex<HashMap<String, Value>>,
    documents: Mutex<HashMap<String, Vec<Value>>>,
    past_queries: Mutex<Vec<PastQuery>>,
    audit_entries: RwLock<Vec<AuditLogEntry>>,
    explanations: RwLock<Vec<QueryExplanationRecord>>,
    fail_explain: AtomicBool,
    fail_audit_writes: AtomicBool,
    fail_explanation_writes: AtomicBool,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self {
            document_counts: Mutex::new(HashMap::new()),
            indexes: Mutex::new(HashMap::new()),
            explain_responses: Mutex::new(HashMap::new()),
            documents: Mutex::new(HashMap::new()),
            past_queries: Mutex::new(Vec::new()),
            audit_entries: RwLock::new(Vec::new()),
            explanations: RwLock::new(Vec::new()),
            fail_explain: AtomicBool::new(false),
            fail_audit_writes: AtomicBool::new(false),
            fail_explanation_writes: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    pub fn set_document_count(&self, collection: &str, count: u64) {
        self.document_counts
            .lock()
            .unwrap()
            .insert(collection.to_string(), count);
    }

    pub fn set_indexes(&self, collection: &str, catalog: Vec<IndexInfo>) {
        self.indexes
            .lock()
            .unwrap()
            .insert(collection.to_string(), catalog);
    }

    pub fn set_explain_response(&self, collection: &str, plan: Value) {
        self.explain_responses
            .lock()
            .unwrap()
            .insert(collection.to_string(), plan);
    }

    pub fn set_documents(&self, collection: &str, docs: Vec<Value>) {
        self.documents
            .lock()
            .unwrap()
            .insert(collection.to_string(), docs);
    }

    pub fn set_past_queries(&self, queries: Vec<PastQuery>) {
        *self.past_queries.lock().unwrap() = queries;
    }

    // ------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------

    pub fn fail_explain(&self, fail: bool) {
        self.fail_explain.store(fail, Ordering::SeqCst);
    }

    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_explanation_writes(&self, fail: bool) {
        self.fail_explanation_writes.store(fail, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.audit_entries.read().await.clone()
    }

    pub async fn explanations(&self) -> Vec<QueryExplanationRecord> {
        self.explanations.read().await.clone()
    }
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn count_documents(&self, collection: &str) -> Result<u64> {
        Ok(self
            .document_counts
            .lock()
            .unwrap()
            .get(collection)
            .copied()
            .unwrap_or(0))
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexInfo>> {
        Ok(self
            .indexes
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn explain(&self, collection: &str, _query: &Value) -> Result<Value> {
        if self.fail_explain.load(Ordering::SeqCst) {
            bail!("explain unavailable");
        }
        self.explain_responses
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no explain response seeded for '{collection}'"))
    }

    async fn find(&self, collection: &str, _query: &Value) -> Result<Vec<Value>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn aggregate(&self, collection: &str, _pipeline: &[Value]) -> Result<Vec<Value>> {
        self.find(collection, &Value::Null).await
    }

    async fn append_audit_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        if self.fail_audit_writes.load(Ordering::SeqCst) {
            bail!("audit collection unavailable");
        }
        self.audit_entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_audit_entries(&self) -> Result<Vec<AuditLogEntry>> {
        Ok(self.audit_entries.read().await.clone())
    }

    async fn append_explanation(&self, record: &QueryExplanationRecord) -> Result<()> {
        if self.fail_explanation_writes.load(Ordering::SeqCst) {
            bail!("explanation collection unavailable");
        }
        self.explanations.write().await.push(record.clone());
        Ok(())
    }

    async fn recent_explanations(&self, limit: usize) -> Result<Vec<PastQuery>> {
        let queries = self.past_queries.lock().unwrap();
        Ok(queries.iter().rev().take(limit).cloned().collect())
    }
}
