//! Lexical safety filter and per-role timeout table.
//!
//! `is_query_safe` is best-effort filtering of destructive intent in the
//! query text. It is not a sandbox: it catches the literal restricted words
//! and nothing more. Semantic safety is out of scope.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::auth::Role;

/// Timeout applied before a role has been resolved.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Whole-word, case-insensitive patterns denoting destructive operations.
static RESTRICTED_OPERATIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(drop|delete|remove|truncate|destroy)\b").expect("valid restricted pattern")
});

/// Decide whether the query text is admissible for the given role.
///
/// Admins are always admitted. For every other role, any whole-word match of
/// a restricted operation rejects the query.
pub fn is_query_safe(text: &str, role: Role) -> bool {
    if role == Role::Admin {
        return true;
    }
    !RESTRICTED_OPERATIONS.is_match(text)
}

/// Fixed per-role query timeout.
pub fn query_timeout_for(role: Role) -> Duration {
    match role {
        Role::Admin => Duration::from_millis(30_000),
        Role::User => Duration::from_millis(15_000),
        Role::ReadOnly => Duration::from_millis(10_000),
    }
}

// ============================================================================
// Tests
// ============================================================================
