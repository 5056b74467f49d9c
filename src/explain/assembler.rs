//! Composes interpretation, execution analysis, and suggestions into one
//! persisted explanation record.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::analyzer::ExecutionAnalyzer;
use super::interpreter::interpret_query;
use super::records::{ExplanationMetadata, OriginalQuery, QueryExplanationRecord};
use super::suggest::SuggestionEngine;
use crate::error::GatewayError;
use crate::store::DocumentStore;

pub struct ExplanationAssembler {
    store: Arc<dyn DocumentStore>,
    analyzer: ExecutionAnalyzer,
    suggester: SuggestionEngine,
}

impl ExplanationAssembler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            analyzer: ExecutionAnalyzer::new(store.clone()),
            suggester: SuggestionEngine::new(store.clone()),
            store,
        }
    }

    /// Explain a resolved query: what it means, how it executed, and what
    /// could be better.
    ///
    /// The analyzer and the suggestion engine run concurrently; if either
    /// fails, the whole call fails and nothing is persisted. Execution data
    /// is the primary value here, so there is no degraded record with empty
    /// execution fields. The record write itself is best-effort: a failed
    /// write is logged and the record is still returned.
    pub async fn explain_query(
        &self,
        text: &str,
        resolved_query: &Value,
        collection: &str,
    ) -> Result<QueryExplanationRecord, GatewayError> {
        let started = Instant::now();

        let interpretation = interpret_query(text);
        let (execution, suggestions) = tokio::try_join!(
            self.analyzer.analyze_execution(resolved_query, collection),
            self.suggester
                .generate_suggestions(text, resolved_query, collection),
        )?;

        let record = QueryExplanationRecord {
            query_id: Uuid::new_v4().to_string(),
            original_query: OriginalQuery {
                text: text.to_string(),
                timestamp: Utc::now(),
            },
            interpretation,
            execution,
            suggestions,
            metadata: ExplanationMetadata {
                collection: collection.to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
                status: "success".to_string(),
            },
        };

        if let Err(e) = self.store.append_explanation(&record).await {
            warn!(
                query_id = %record.query_id,
                collection = %collection,
                error = %e,
                "explanation write failed; record returned unpersisted"
            );
        }

        Ok(record)
    }
}

// ============================================================================
// Tests
// ============================================================================
