//! Index-usage and complexity analysis against a live explain plan.
//!
//! The analyzer consumes three things from the storage seam: the
//! collection's document count, its index catalog, and an execution-stats
//! explain of the resolved query. Any of those failing fails the analysis
//! as a whole — execution data is the point of this component, so there is
//! no degraded partial output.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::records::{
    ComplexityClass, ComplexitySummary, ExecutionSummary, IndexKind, IndexUsage,
};
use crate::error::GatewayError;
use crate::store::{DocumentStore, IndexInfo};

pub struct ExecutionAnalyzer {
    store: Arc<dyn DocumentStore>,
}

impl ExecutionAnalyzer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Analyze how the store executed (or would execute) `query` against
    /// `collection`.
    pub async fn analyze_execution(
        &self,
        query: &Value,
        collection: &str,
    ) -> Result<ExecutionSummary, GatewayError> {
        let total_docs = self
            .store
            .count_documents(collection)
            .await
            .map_err(GatewayError::Analysis)?;
        let catalog = self
            .store
            .list_indexes(collection)
            .await
            .map_err(GatewayError::Analysis)?;
        let plan = self
            .store
            .explain(collection, query)
            .await
            .map_err(GatewayError::Analysis)?;

        let n_returned = plan["executionStats"]["nReturned"].as_u64().unwrap_or(0);
        let docs_examined = plan["executionStats"]["totalDocsExamined"]
            .as_u64()
            .unwrap_or(0);

        let mut used_indexes = Vec::new();
        if let Some(winning_plan) = plan
            .get("queryPlanner")
            .and_then(|p| p.get("winningPlan"))
        {
            collect_used_indexes(
                winning_plan,
                &catalog,
                n_returned,
                docs_examined,
                &mut used_indexes,
            );
        }

        let complexity = ComplexitySummary {
            class: classify(docs_examined, total_docs),
            documents_examined: docs_examined,
            indexes_used: used_indexes.len(),
        };

        Ok(ExecutionSummary {
            used_indexes,
            complexity,
        })
    }
}

/// Walk the winning plan, recursing into `inputStage` before emitting the
/// current node, so results come out leaf-to-root.
fn collect_used_indexes(
    node: &Value,
    catalog: &[IndexInfo],
    n_returned: u64,
    docs_examined: u64,
    out: &mut Vec<IndexUsage>,
) {
    if let Some(input) = node.get("inputStage") {
        collect_used_indexes(input, catalog, n_returned, docs_examined, out);
    }

    if let Some(name) = node.get("indexName").and_then(Value::as_str) {
        match catalog.iter().find(|i| i.name == name) {
            Some(info) => out.push(IndexUsage {
                name: info.name.clone(),
                key_spec: info.key.clone(),
                kind: kind_of(info),
                efficiency: efficiency(n_returned, docs_examined),
            }),
            None => debug!(index = name, "plan references an index missing from the catalog"),
        }
    }
}

/// First matching flag wins: unique, sparse, background, then standard.
fn kind_of(info: &IndexInfo) -> IndexKind {
    if info.unique {
        IndexKind::Unique
    } else if info.sparse {
        IndexKind::Sparse
    } else if info.background {
        IndexKind::Background
    } else {
        IndexKind::Standard
    }
}

/// Selectivity proxy. Zero documents examined is a guard case, not a
/// division: it yields 1.
fn efficiency(n_returned: u64, docs_examined: u64) -> f64 {
    if docs_examined == 0 {
        return 1.0;
    }
    n_returned as f64 / docs_examined as f64
}

fn classify(docs_examined: u64, total_docs: u64) -> ComplexityClass {
    if docs_examined == 0 {
        ComplexityClass::Constant
    } else if docs_examined < total_docs {
        ComplexityClass::Logarithmic
    } else {
        ComplexityClass::Linear
    }
}

// ============================================================================
// Tests
// ============================================================================
