//! Heuristic interpretation of natural-language query text.
//!
//! Keyword and pattern extraction only, no real NL understanding. Intent is
//! decided by the first matching pattern in a fixed priority order; entities
//! and conditions are extracted independently, so one query can surface
//! several of each.

use std::sync::LazyLock;

use regex::Regex;

use super::records::{Condition, Entity, EntityType, Intent, Interpretation};

// Intent keywords match as substrings, so morphological variants like
// "deleted" or "searching" still classify.
static READ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(find|search|get|retrieve)").expect("read pattern"));
static AGGREGATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(count|sum|average|mean)").expect("aggregate pattern"));
static UPDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(update|modify|change)").expect("update pattern"));
static DELETE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(delete|remove)").expect("delete pattern"));
static CREATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(create|insert|add)").expect("create pattern"));

/// ISO-like dates: `YYYY-MM-DD` or `M/D/YYYY`.
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4})\b").expect("date pattern")
});
/// Integers and decimals.
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("number pattern"));
/// Single- or double-quoted substrings.
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("quoted pattern"));

static GREATER_THAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(greater than|more than|above|over)\b").expect("greater-than pattern")
});
static LESS_THAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(less than|under|below)\b").expect("less-than pattern")
});
static EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(equal to|equals|exactly)\b").expect("equals pattern")
});
static BETWEEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbetween\b").expect("between pattern"));
static NOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(not|without|except|excluding)\b").expect("not pattern"));

/// Interpret free text into intent, entities, conditions, and a confidence
/// score.
///
/// Confidence: base 0.5, +0.2 for a known intent, +0.1 per entity up to 3,
/// −0.2 for very short text (< 5 chars), clamped at 1.0 from above only.
/// The raw value below the clamp is preserved as computed.
pub fn interpret_query(text: &str) -> Interpretation {
    let intent = detect_intent(text);
    let entities = extract_entities(text);
    let conditions = detect_conditions(text);

    let mut confidence = 0.5;
    if intent != Intent::Unknown {
        confidence += 0.2;
    }
    confidence += 0.1 * entities.len().min(3) as f64;
    if text.len() < 5 {
        confidence -= 0.2;
    }
    let confidence = confidence.min(1.0);

    Interpretation {
        intent,
        entities,
        conditions,
        confidence,
    }
}

/// First pattern match wins, in fixed priority order.
fn detect_intent(text: &str) -> Intent {
    let table: [(&Regex, Intent); 5] = [
        (&READ, Intent::Read),
        (&AGGREGATE, Intent::Aggregate),
        (&UPDATE, Intent::Update),
        (&DELETE, Intent::Delete),
        (&CREATE, Intent::Create),
    ];
    for (pattern, intent) in table {
        if pattern.is_match(text) {
            return intent;
        }
    }
    Intent::Unknown
}

fn extract_entities(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    // Dates first; their spans mask the digits inside them so the number
    // pass does not double-count date components.
    let mut date_spans: Vec<(usize, usize)> = Vec::new();
    for m in DATE.find_iter(text) {
        date_spans.push((m.start(), m.end()));
        entities.push(Entity {
            name: "date".to_string(),
            value: m.as_str().to_string(),
            entity_type: EntityType::Date,
        });
    }

    for m in NUMBER.find_iter(text) {
        let inside_date = date_spans
            .iter()
            .any(|&(start, end)| m.start() >= start && m.end() <= end);
        if inside_date {
            continue;
        }
        entities.push(Entity {
            name: "number".to_string(),
            value: m.as_str().to_string(),
            entity_type: EntityType::Number,
        });
    }

    for caps in QUOTED.captures_iter(text) {
        let value = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        entities.push(Entity {
            name: "string".to_string(),
            value: value.to_string(),
            entity_type: EntityType::String,
        });
    }

    entities
}

fn detect_conditions(text: &str) -> Vec<Condition> {
    let table: [(&Regex, Condition); 5] = [
        (&GREATER_THAN, Condition::GreaterThan),
        (&LESS_THAN, Condition::LessThan),
        (&EQUALS, Condition::Equals),
        (&BETWEEN, Condition::Between),
        (&NOT, Condition::Not),
    ];
    table
        .into_iter()
        .filter(|(pattern, _)| pattern.is_match(text))
        .map(|(_, condition)| condition)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
