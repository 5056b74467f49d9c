//! Query explanation engine.
//!
//! Three independent analyses compose into one persisted record:
//! - `interpreter` — heuristic intent/entity/condition extraction from the
//!   natural-language text (pure, no I/O)
//! - `analyzer` — index usage and complexity from the live explain plan
//! - `suggest` — alternative phrasings, optimization tips, and index
//!   recommendations
//!
//! `assembler` orchestrates them and owns the composed record.

pub mod analyzer;
pub mod assembler;
pub mod interpreter;
pub mod records;
pub mod similarity;
pub mod suggest;

pub use analyzer::ExecutionAnalyzer;
pub use assembler::ExplanationAssembler;
pub use interpreter::interpret_query;
pub use records::{
    ComplexityClass, ComplexitySummary, Condition, Entity, EntityType, ExecutionSummary,
    ExplanationMetadata, IndexKind, IndexRecommendation, IndexUsage, Intent, Interpretation,
    OriginalQuery, QueryExplanationRecord, SuggestionSet,
};
pub use suggest::SuggestionEngine;
