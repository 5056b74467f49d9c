//! Read-only projections over stored audit entries.
//!
//! Plain aggregation arithmetic; the only invariant worth stating is that
//! zero stored entries yield zeroed averages, never NaN.

use chrono::NaiveDate;
use serde::Serialize;

use super::{AuditLogEntry, AuditRecorder, QueryStatus};
use crate::error::GatewayError;

/// Whole-log rollup.
#[derive(Debug, Clone, Serialize)]
pub struct QueryStats {
    pub total_queries: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// success_count / total_queries, 0.0 when the log is empty
    pub success_rate: f64,
    pub avg_total_duration_ms: f64,
    pub avg_token_count: f64,
}

/// Per-day rollup.
#[derive(Debug, Clone, Serialize)]
pub struct DailyMetrics {
    pub day: NaiveDate,
    pub query_count: usize,
    pub error_count: usize,
    pub avg_duration_ms: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl AuditRecorder {
    /// Counts, averages, and success rate over the whole audit log.
    pub async fn get_query_stats(&self) -> Result<QueryStats, GatewayError> {
        let entries = self.entries().await?;
        let total_queries = entries.len();
        let success_count = entries
            .iter()
            .filter(|e| e.outcome.status == QueryStatus::Success)
            .count();
        let error_count = total_queries - success_count;

        if total_queries == 0 {
            return Ok(QueryStats {
                total_queries: 0,
                success_count: 0,
                error_count: 0,
                success_rate: 0.0,
                avg_total_duration_ms: 0.0,
                avg_token_count: 0.0,
            });
        }

        let n = total_queries as f64;
        let duration_sum: u64 = entries
            .iter()
            .map(|e| e.performance.total_duration_ms)
            .sum();
        let token_sum: u64 = entries.iter().map(|e| e.performance.token_count).sum();

        Ok(QueryStats {
            total_queries,
            success_count,
            error_count,
            success_rate: round2(success_count as f64 / n),
            avg_total_duration_ms: round2(duration_sum as f64 / n),
            avg_token_count: round2(token_sum as f64 / n),
        })
    }

    /// Up to `limit` most recent entries, newest first.
    pub async fn get_recent_queries(&self, limit: usize) -> Result<Vec<AuditLogEntry>, GatewayError> {
        let mut entries = self.entries().await?;
        entries.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Per-day query counts, error counts, and average durations, oldest day
    /// first.
    pub async fn get_performance_metrics(&self) -> Result<Vec<DailyMetrics>, GatewayError> {
        let entries = self.entries().await?;

        let mut by_day: std::collections::BTreeMap<NaiveDate, Vec<&AuditLogEntry>> =
            std::collections::BTreeMap::new();
        for entry in &entries {
            by_day
                .entry(entry.timestamp.date_naive())
                .or_default()
                .push(entry);
        }

        Ok(by_day
            .into_iter()
            .map(|(day, day_entries)| {
                let query_count = day_entries.len();
                let error_count = day_entries
                    .iter()
                    .filter(|e| e.outcome.status == QueryStatus::Error)
                    .count();
                let duration_sum: u64 = day_entries
                    .iter()
                    .map(|e| e.performance.total_duration_ms)
                    .sum();
                DailyMetrics {
                    day,
                    query_count,
                    error_count,
                    avg_duration_ms: round2(duration_sum as f64 / query_count as f64),
                }
            })
            .collect())
    }

    async fn entries(&self) -> Result<Vec<AuditLogEntry>, GatewayError> {
        self.store()
            .list_audit_entries()
            .await
            .map_err(GatewayError::Persistence)
    }
}

// ============================================================================
// Tests
// ============================================================================
