//! Explanation record types.
//!
//! A [`QueryExplanationRecord`] is created once per explained request and is
//! immutable after creation. `query_id` is caller-opaque; it exists only for
//! later retrieval and audit correlation. Explanation records and audit
//! entries are deliberately independent siblings — no shared foreign key —
//! so an explanation failure can never block an audit write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived intent of the natural-language query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Read,
    Aggregate,
    Update,
    Delete,
    Create,
    Unknown,
}

/// Kind of value an extracted entity carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Date,
    Number,
    String,
}

/// One extracted entity. `value` is the matched text, with quotes stripped
/// for strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

/// Comparison intent detected in the text. Several may co-occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    GreaterThan,
    LessThan,
    Equals,
    Between,
    Not,
}

/// What the interpreter made of the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub intent: Intent,
    pub entities: Vec<Entity>,
    pub conditions: Vec<Condition>,
    /// Heuristic score; upper-clamped at 1.0, raw value preserved below that.
    pub confidence: f64,
}

/// Index kind, first matching flag wins in this priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexKind {
    Unique,
    Sparse,
    Background,
    Standard,
}

/// One index the winning plan actually used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexUsage {
    pub name: String,
    pub key_spec: Vec<(String, i32)>,
    pub kind: IndexKind,
    /// nReturned / totalDocsExamined; 1.0 when nothing was examined.
    pub efficiency: f64,
}

/// Coarse, ordinal complexity class. Not asymptotically rigorous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexityClass {
    #[serde(rename = "O(1)")]
    Constant,
    #[serde(rename = "O(log n)")]
    Logarithmic,
    #[serde(rename = "O(n)")]
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexitySummary {
    pub class: ComplexityClass,
    pub documents_examined: u64,
    pub indexes_used: usize,
}

/// Output of the execution analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub used_indexes: Vec<IndexUsage>,
    pub complexity: ComplexitySummary,
}

/// A missing-index recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecommendation {
    pub fields: Vec<String>,
    pub reason: String,
}

/// Output of the suggestion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    /// Max 3, deduplicated.
    pub alternative_phrasing: Vec<String>,
    pub optimization_tips: Vec<String>,
    pub recommended_indexes: Vec<IndexRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalQuery {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationMetadata {
    pub collection: String,
    pub duration_ms: u64,
    pub status: String,
}

/// The composed, persisted explanation for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExplanationRecord {
    pub query_id: String,
    pub original_query: OriginalQuery,
    pub interpretation: Interpretation,
    pub execution: ExecutionSummary,
    pub suggestions: SuggestionSet,
    pub metadata: ExplanationMetadata,
}
