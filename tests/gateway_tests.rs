//! End-to-end tests for the gateway pipeline: authorize → timeout-wrapped
//! processing → explanation → audit, against an in-memory document store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio_test::assert_ok;

use query_gateway::audit::{AuditLogEntry, AuditRequest, CHECKPOINT_EXECUTION, CHECKPOINT_GENERATION};
use query_gateway::auth::token::encode_jwt;
use query_gateway::auth::{PolicyConfig, Role};
use query_gateway::explain::{ComplexityClass, Intent, QueryExplanationRecord};
use query_gateway::store::{DocumentStore, IndexInfo, PastQuery};
use query_gateway::timeout::GatewayResponse;
use query_gateway::{Config, Gateway};

const TEST_SECRET: &str = "integration-secret-min-32-chars!!!";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "query_gateway=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Minimal in-memory store for the integration scenarios.
struct MemoryStore {
    counts: Mutex<HashMap<String, u64>>,
    indexes: Mutex<HashMap<String, Vec<IndexInfo>>>,
    explains: Mutex<HashMap<String, Value>>,
    past: Mutex<Vec<PastQuery>>,
    audit: RwLock<Vec<AuditLogEntry>>,
    explanations: RwLock<Vec<QueryExplanationRecord>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            indexes: Mutex::new(HashMap::new()),
            explains: Mutex::new(HashMap::new()),
            past: Mutex::new(Vec::new()),
            audit: RwLock::new(Vec::new()),
            explanations: RwLock::new(Vec::new()),
        }
    }

    fn seeded() -> Self {
        let store = Self::new();
        store.counts.lock().unwrap().insert("events".into(), 5000);
        store.indexes.lock().unwrap().insert(
            "events".into(),
            vec![IndexInfo {
                name: "status_1".into(),
                key: vec![("status".into(), 1)],
                unique: false,
                sparse: false,
                background: false,
            }],
        );
        store.explains.lock().unwrap().insert(
            "events".into(),
            json!({
                "queryPlanner": {
                    "winningPlan": {
                        "stage": "FETCH",
                        "inputStage": { "stage": "IXSCAN", "indexName": "status_1" }
                    }
                },
                "executionStats": { "nReturned": 120, "totalDocsExamined": 150 }
            }),
        );
        store.past.lock().unwrap().push(PastQuery {
            text: "find all open events from last week".into(),
            status: "success".into(),
            timestamp: Utc::now(),
        });
        store
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn count_documents(&self, collection: &str) -> Result<u64> {
        Ok(self
            .counts
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
        self.explains
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no explain plan for '{collection}'"))
    }

    async fn find(&self, _collection: &str, _query: &Value) -> Result<Vec<Value>> {
        Ok(vec![])
    }

    async fn aggregate(&self, _collection: &str, _pipeline: &[Value]) -> Result<Vec<Value>> {
        Ok(vec![])
    }

    async fn append_audit_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        self.audit.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_audit_entries(&self) -> Result<Vec<AuditLogEntry>> {
        Ok(self.audit.read().await.clone())
    }

    async fn append_explanation(&self, record: &QueryExplanationRecord) -> Result<()> {
        self.explanations.write().await.push(record.clone());
        Ok(())
    }

    async fn recent_explanations(&self, limit: usize) -> Result<Vec<PastQuery>> {
        Ok(self.past.lock().unwrap().iter().rev().take(limit).cloned().collect())
    }
}

fn test_config() -> Config {
    Config {
        jwt_secret: TEST_SECRET.to_string(),
        policy: PolicyConfig {
            admin: vec!["*".to_string()],
            user: vec!["events".to_string()],
            readonly: vec!["events".to_string()],
        },
        cache_capacity: 32,
        cache_ttl: Duration::from_secs(900),
    }
}

#[tokio::test]
async fn full_request_lifecycle() {
    init_tracing();
    let store = Arc::new(MemoryStore::seeded());
    let gateway = Gateway::new(&test_config(), store.clone());

    let token = encode_jwt("alice", Role::User, TEST_SECRET, 3600).unwrap();
    let text = "find all open events from last month";
    let resolved_query = json!({ "status": "open" });

    // 1. Admission
    let grant = gateway.authorize_request(&token, "events", text).unwrap();
    assert_eq!(grant.role, Role::User);

    // 2. Track timings across the (simulated) downstream call
    let mut tracker = gateway.audit().start_tracking();
    tracker.mark_checkpoint(CHECKPOINT_GENERATION);
    tracker.mark_checkpoint(CHECKPOINT_EXECUTION);

    // 3. Explain
    let record = gateway
        .explain_query(text, &resolved_query, "events")
        .await
        .unwrap();
    assert_eq!(record.interpretation.intent, Intent::Read);
    assert_eq!(record.execution.used_indexes.len(), 1);
    assert_eq!(record.execution.complexity.class, ComplexityClass::Logarithmic);
    // Similar past query surfaces as an alternative phrasing
    assert!(record
        .suggestions
        .alternative_phrasing
        .contains(&"find all open events from last week".to_string()));

    // 4. Audit, fire-and-forget
    let entry = gateway.audit().log_query(
        &tracker,
        AuditRequest {
            subject_id: "alice",
            role: grant.role,
            natural_language_query: text,
            resolved_query: &resolved_query,
            collection: "events",
            token_count: 37,
            error: None,
        },
    );
    assert_eq!(entry.performance.token_count, 37);

    // The audit write lands without being awaited by the response path
    let mut persisted = 0;
    for _ in 0..50 {
        tokio::task::yield_now().await;
        persisted = store.list_audit_entries().await.unwrap().len();
        if persisted > 0 {
            break;
        }
    }
    assert_eq!(persisted, 1);

    // Explanation record was persisted independently
    assert_eq!(store.explanations.read().await.len(), 1);

    // Aggregations see the entry
    let stats = gateway.audit().get_query_stats().await.unwrap();
    assert_eq!(stats.total_queries, 1);
    assert_eq!(stats.success_rate, 1.0);
}

#[tokio::test]
async fn denied_requests_short_circuit() {
    let store = Arc::new(MemoryStore::seeded());
    let gateway = Gateway::new(&test_config(), store.clone());

    // readonly role, restricted word
    let token = encode_jwt("bob", Role::ReadOnly, TEST_SECRET, 3600).unwrap();
    let err = gateway
        .authorize_request(&token, "events", "delete old events")
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    // unknown collection
    let err = gateway
        .authorize_request(&token, "payroll", "find salaries")
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    // no explanation or audit side effects
    assert!(store.explanations.read().await.is_empty());
    assert!(store.list_audit_entries().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timeout_bounds_the_caller_not_the_work() {
    let store = Arc::new(MemoryStore::seeded());
    let gateway = Gateway::new(&test_config(), store);

    // readonly deadline is 10s; the simulated downstream call takes 12s
    let response = gateway
        .wrap_with_timeout(Some(Role::ReadOnly), |responder| async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            responder.respond(GatewayResponse::ok(json!({ "rows": 99 })));
        })
        .await;

    assert_eq!(response.status, 408);
}

#[tokio::test]
async fn permission_cache_reuses_grants() {
    let store = Arc::new(MemoryStore::seeded());
    let gateway = Gateway::new(&test_config(), store);
    let token = encode_jwt("carol", Role::User, TEST_SECRET, 3600).unwrap();

    assert_ok!(gateway.resolve_permission(&token));
    assert_ok!(gateway.resolve_permission(&token));
    assert_ok!(gateway.resolve_permission(&token));

    let (hits, misses) = gateway.permissions().cache_stats();
    assert_eq!(misses, 1);
    assert_eq!(hits, 2);
}
