//! Role grants and the cached permission store.
//!
//! A verified token resolves to a [`RoleGrant`] derived from static policy.
//! Derived grants sit in a capacity-bounded LRU keyed by subject id, with a
//! per-entry TTL checked against an injectable clock so expiry is testable.
//! The grant is a pure function of the role, so racing inserts for the same
//! subject are harmless (last writer wins).

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::token::TokenVerifier;
use crate::error::AuthError;

/// Grant cache TTL. Entries older than this are re-derived on next lookup.
pub const CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Default grant cache capacity (entries).
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Caller role, declared in the token and mapped to a grant by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    ReadOnly,
}

/// Resolved permissions for a subject: role plus allowed collections.
///
/// The literal `*` grants access to every collection and dominates any
/// explicit list entries. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub allowed_collections: Vec<String>,
}

impl RoleGrant {
    /// True iff the grant covers `collection`: wildcard `*` or exact literal
    /// membership, nothing else (no prefix or glob matching).
    pub fn has_collection_access(&self, collection: &str) -> bool {
        self.allowed_collections
            .iter()
            .any(|c| c == "*" || c == collection)
    }
}

/// Static role-to-collections policy, loaded once from configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub admin: Vec<String>,
    pub user: Vec<String>,
    pub readonly: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            admin: vec!["*".to_string()],
            user: vec!["*".to_string()],
            readonly: vec!["*".to_string()],
        }
    }
}

impl PolicyConfig {
    /// Derive the grant for a role. Every role maps to exactly one grant.
    pub fn grant_for(&self, role: Role) -> RoleGrant {
        let allowed_collections = match role {
            Role::Admin => self.admin.clone(),
            Role::User => self.user.clone(),
            Role::ReadOnly => self.readonly.clone(),
        };
        RoleGrant {
            role,
            allowed_collections,
        }
    }
}

/// Monotonic clock seam, injectable for TTL tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry {
    grant: RoleGrant,
    inserted_at: Instant,
}

/// Resolves bearer tokens to role grants, with a bounded TTL cache.
///
/// Eviction is whichever comes first: LRU capacity pressure or the 15-minute
/// TTL. Expired entries are dropped and re-derived transparently on the next
/// lookup for that subject.
pub struct PermissionStore {
    verifier: Arc<dyn TokenVerifier>,
    policy: PolicyConfig,
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl PermissionStore {
    pub fn new(verifier: Arc<dyn TokenVerifier>, policy: PolicyConfig, capacity: usize) -> Self {
        Self::with_clock(verifier, policy, capacity, CACHE_TTL, Arc::new(SystemClock))
    }

    /// Full constructor with injectable TTL and clock.
    pub fn with_clock(
        verifier: Arc<dyn TokenVerifier>,
        policy: PolicyConfig,
        capacity: usize,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            verifier,
            policy,
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock,
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    /// Verify the token and return the subject's grant, cached when fresh.
    pub fn resolve(&self, token: &str) -> Result<RoleGrant, AuthError> {
        let claims = self.verifier.verify(token)?;
        let now = self.clock.now();

        let mut cache = self.cache.lock().expect("permission cache poisoned");
        let cached = cache
            .get(&claims.sub)
            .map(|entry| (entry.inserted_at, entry.grant.clone()));
        if let Some((inserted_at, grant)) = cached {
            if now.duration_since(inserted_at) < self.ttl {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(grant);
            }
            cache.pop(&claims.sub);
        }

        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        let grant = self.policy.grant_for(claims.role);
        cache.put(
            claims.sub,
            CacheEntry {
                grant: grant.clone(),
                inserted_at: now,
            },
        );
        Ok(grant)
    }

    /// (hits, misses) since construction. A miss means the grant was
    /// re-derived from policy.
    pub fn cache_stats(&self) -> (u64, u64) {
        (
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
        )
    }

    /// Current number of cached grants (expired entries included until their
    /// next lookup).
    pub fn cached_subjects(&self) -> usize {
        self.cache.lock().expect("permission cache poisoned").len()
    }
}

/// Test clock that only advances when told to.
#[cfg(test)]
pub(crate) struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap()
    }
}

// ============================================================================
// Tests
// ============================================================================
