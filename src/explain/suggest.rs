//! Alternative phrasings, optimization tips, and index recommendations.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value};

use super::records::{IndexRecommendation, SuggestionSet};
use super::similarity::dice_coefficient;
use crate::error::GatewayError;
use crate::store::{DocumentStore, IndexInfo};

/// How many past explanation records feed the similarity search.
const SIMILARITY_CORPUS_SIZE: usize = 100;
/// Minimum Dice score for a past query to count as an alternative phrasing.
const SIMILARITY_THRESHOLD: f64 = 0.6;
/// Upper bound on returned phrasings.
const MAX_PHRASINGS: usize = 3;
/// `$in`/`$nin` arrays larger than this get a batching tip.
const MAX_IN_CLAUSE_SIZE: usize = 50;

/// Fixed lexical rewrites, matched case-insensitively; only the matched
/// phrase is substituted, the surrounding text keeps its casing.
static REWRITES: LazyLock<[(Regex, &str); 2]> = LazyLock::new(|| {
    [
        (
            Regex::new("(?i)greater than").expect("rewrite pattern"),
            "more than",
        ),
        (Regex::new("(?i)less than").expect("rewrite pattern"), "under"),
    ]
});

pub struct SuggestionEngine {
    store: Arc<dyn DocumentStore>,
}

impl SuggestionEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn generate_suggestions(
        &self,
        text: &str,
        query: &Value,
        collection: &str,
    ) -> Result<SuggestionSet, GatewayError> {
        let alternative_phrasing = self.alternative_phrasings(text).await?;
        let optimization_tips = optimization_tips(query);
        let recommended_indexes = self.recommended_indexes(query, collection).await?;

        Ok(SuggestionSet {
            alternative_phrasing,
            optimization_tips,
            recommended_indexes,
        })
    }

    /// Similar past queries above the threshold, plus fixed rewrites; merged,
    /// deduplicated, capped at [`MAX_PHRASINGS`].
    async fn alternative_phrasings(&self, text: &str) -> Result<Vec<String>, GatewayError> {
        let corpus = self
            .store
            .recent_explanations(SIMILARITY_CORPUS_SIZE)
            .await
            .map_err(GatewayError::Analysis)?;

        let mut scored: Vec<(f64, String)> = corpus
            .into_iter()
            .filter(|past| past.status == "success")
            .map(|past| (dice_coefficient(&past.text, text), past.text))
            .filter(|(score, candidate)| *score > SIMILARITY_THRESHOLD && candidate != text)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut phrasings: Vec<String> = scored
            .into_iter()
            .take(MAX_PHRASINGS)
            .map(|(_, candidate)| candidate)
            .collect();

        for (pattern, replacement) in REWRITES.iter() {
            if pattern.is_match(text) {
                phrasings.push(pattern.replace_all(text, *replacement).into_owned());
            }
        }

        let mut seen = std::collections::HashSet::new();
        phrasings.retain(|p| seen.insert(p.clone()));
        phrasings.truncate(MAX_PHRASINGS);
        Ok(phrasings)
    }

    /// Single-field recommendations for unindexed referenced fields, plus one
    /// compound recommendation when no existing index covers all of them.
    async fn recommended_indexes(
        &self,
        query: &Value,
        collection: &str,
    ) -> Result<Vec<IndexRecommendation>, GatewayError> {
        let fields = referenced_fields(query);
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let catalog = self
            .store
            .list_indexes(collection)
            .await
            .map_err(GatewayError::Analysis)?;

        let mut recommendations = Vec::new();
        for field in &fields {
            if !is_indexed(&catalog, field) {
                recommendations.push(IndexRecommendation {
                    fields: vec![field.clone()],
                    reason: format!("field '{field}' is queried but has no index"),
                });
            }
        }

        if fields.len() > 1 && !any_index_covers(&catalog, &fields) {
            recommendations.push(IndexRecommendation {
                fields: fields.clone(),
                reason: format!(
                    "no existing index covers all {} queried fields together",
                    fields.len()
                ),
            });
        }

        Ok(recommendations)
    }
}

/// Three independent pattern checks; each appends at most one tip.
pub(crate) fn optimization_tips(query: &Value) -> Vec<String> {
    let mut tips = Vec::new();

    if is_full_scan_shape(query) {
        tips.push(
            "query has no selective criteria and will scan the whole collection; add a filter"
                .to_string(),
        );
    }

    if has_unanchored_regex(query) {
        tips.push(
            "unanchored regular expressions cannot use index prefixes; anchor with '^' where possible"
                .to_string(),
        );
    }

    if let Some(size) = oversized_in_clause(query) {
        tips.push(format!(
            "$in/$nin clause with {size} values exceeds {MAX_IN_CLAUSE_SIZE}; consider batching"
        ));
    }

    tips
}

/// Empty object, or a single operator wrapper key (`$match`, `$or`, ...)
/// with no plain field criteria next to it.
fn is_full_scan_shape(query: &Value) -> bool {
    match query.as_object() {
        None => true,
        Some(obj) if obj.is_empty() => true,
        Some(obj) => obj.len() == 1 && obj.keys().next().is_some_and(|k| k.starts_with('$')),
    }
}

fn has_unanchored_regex(value: &Value) -> bool {
    match value {
        Value::Object(obj) => obj.iter().any(|(key, v)| {
            if key == "$regex" {
                v.as_str().is_some_and(|pattern| !pattern.starts_with('^'))
            } else {
                has_unanchored_regex(v)
            }
        }),
        Value::Array(items) => items.iter().any(has_unanchored_regex),
        _ => false,
    }
}

fn oversized_in_clause(value: &Value) -> Option<usize> {
    match value {
        Value::Object(obj) => obj.iter().find_map(|(key, v)| {
            if key == "$in" || key == "$nin" {
                v.as_array()
                    .map(|arr| arr.len())
                    .filter(|len| *len > MAX_IN_CLAUSE_SIZE)
            } else {
                oversized_in_clause(v)
            }
        }),
        Value::Array(items) => items.iter().find_map(oversized_in_clause),
        _ => None,
    }
}

/// Leaf field paths referenced by the query, dot-joined through nesting,
/// operator keys skipped, in first-seen order without duplicates.
pub(crate) fn referenced_fields(query: &Value) -> Vec<String> {
    let mut fields = Vec::new();
    if let Some(obj) = query.as_object() {
        collect_fields(obj, "", &mut fields);
    }
    let mut seen = std::collections::HashSet::new();
    fields.retain(|f| seen.insert(f.clone()));
    fields
}

fn collect_fields(obj: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in obj {
        if key.starts_with('$') {
            // Operator: descend without extending the path
            match value {
                Value::Object(inner) => collect_fields(inner, prefix, out),
                Value::Array(items) => {
                    for item in items {
                        if let Some(inner) = item.as_object() {
                            collect_fields(inner, prefix, out);
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            // Nested sub-document with plain keys: recurse deeper
            Value::Object(inner) if inner.keys().any(|k| !k.starts_with('$')) => {
                collect_fields(inner, &path, out);
            }
            // Scalar or operator expression: this is the leaf field
            _ => out.push(path),
        }
    }
}

/// Present in any index key, with or without direction.
fn is_indexed(catalog: &[IndexInfo], field: &str) -> bool {
    catalog
        .iter()
        .any(|index| index.fields().any(|f| f == field))
}

fn any_index_covers(catalog: &[IndexInfo], fields: &[String]) -> bool {
    catalog.iter().any(|index| {
        fields
            .iter()
            .all(|field| index.fields().any(|f| f == field))
    })
}

// ============================================================================
// Tests
// ============================================================================
