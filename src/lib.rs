//! Query Gateway
//!
//! A governance-and-explanation layer in front of a document database:
//! - Role-based permission resolution with a bounded TTL cache
//! - Best-effort lexical filtering of destructive query text
//! - Per-role deadline enforcement with exactly-one-response semantics
//! - Fire-and-forget audit recording with sub-operation timing
//! - Query explanation: interpretation, index/complexity analysis against
//!   the live explain plan, and suggestion generation
//!
//! Natural-language-to-query translation, the storage engine, and the HTTP
//! transport are external collaborators reached through the seams in
//! `auth::token` and `store`.

pub mod audit;
pub mod auth;
pub mod error;
pub mod explain;
pub mod safety;
pub mod store;
pub mod timeout;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use audit::AuditRecorder;
use auth::permissions::{CACHE_TTL, DEFAULT_CACHE_CAPACITY};
use auth::{JwtVerifier, PermissionStore, PolicyConfig, Role, RoleGrant};
use error::{AuthError, GatewayError};
use explain::{ExplanationAssembler, QueryExplanationRecord};
use store::DocumentStore;
use timeout::{GatewayResponse, Responder};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub auth: AuthYamlConfig,
    pub policy: PolicyConfig,
    pub cache: CacheYamlConfig,
}

/// Auth configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthYamlConfig {
    /// JWT signing secret (HS256)
    pub jwt_secret: String,
}

impl Default for AuthYamlConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "gateway-dev-secret-change-me-32ch!".into(),
        }
    }
}

/// Permission cache configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheYamlConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheYamlConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl_secs: CACHE_TTL.as_secs(),
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub policy: PolicyConfig,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env
    /// vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file
    /// doesn't exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            jwt_secret: std::env::var("GATEWAY_JWT_SECRET").unwrap_or(yaml.auth.jwt_secret),
            policy: yaml.policy,
            cache_capacity: std::env::var("GATEWAY_CACHE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.cache.capacity),
            cache_ttl: Duration::from_secs(
                std::env::var("GATEWAY_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(yaml.cache.ttl_secs),
            ),
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any
    /// failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Gateway facade
// ============================================================================

/// The governance pipeline, wired once at process start and passed by
/// reference to request handlers. No ambient singletons.
pub struct Gateway {
    permissions: Arc<PermissionStore>,
    audit: Arc<AuditRecorder>,
    explainer: Arc<ExplanationAssembler>,
}

impl Gateway {
    /// Wire all components against a document store.
    pub fn new(config: &Config, store: Arc<dyn DocumentStore>) -> Self {
        let verifier = Arc::new(JwtVerifier::new(config.jwt_secret.clone()));
        let permissions = Arc::new(PermissionStore::with_clock(
            verifier,
            config.policy.clone(),
            config.cache_capacity,
            config.cache_ttl,
            Arc::new(auth::permissions::SystemClock),
        ));

        Self {
            permissions,
            audit: Arc::new(AuditRecorder::new(store.clone())),
            explainer: Arc::new(ExplanationAssembler::new(store)),
        }
    }

    /// Verify the token and return the caller's grant.
    pub fn resolve_permission(&self, token: &str) -> Result<RoleGrant, AuthError> {
        self.permissions.resolve(token)
    }

    /// Full admission gate: identity, collection access, then the lexical
    /// safety filter. Hard failures only; passing means the request may
    /// proceed to execution.
    pub fn authorize_request(
        &self,
        token: &str,
        collection: &str,
        text: &str,
    ) -> Result<RoleGrant, GatewayError> {
        let grant = self.resolve_permission(token)?;

        if !grant.has_collection_access(collection) {
            return Err(GatewayError::AccessDenied(format!(
                "role has no access to collection '{collection}'"
            )));
        }

        if !safety::is_query_safe(text, grant.role) {
            return Err(GatewayError::AccessDenied(
                "query text matched a restricted operation".to_string(),
            ));
        }

        Ok(grant)
    }

    /// See [`safety::is_query_safe`].
    pub fn is_query_safe(&self, text: &str, role: Role) -> bool {
        safety::is_query_safe(text, role)
    }

    /// Race a continuation against the role's deadline. See
    /// [`timeout::wrap_with_timeout`].
    pub async fn wrap_with_timeout<F, Fut>(
        &self,
        role: Option<Role>,
        continuation: F,
    ) -> GatewayResponse
    where
        F: FnOnce(Responder) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        timeout::wrap_with_timeout(role, continuation).await
    }

    /// The audit recorder, for request handlers to track and log with.
    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }

    /// The permission store, exposed for cache introspection.
    pub fn permissions(&self) -> &PermissionStore {
        &self.permissions
    }

    /// Explain a resolved query against its collection.
    pub async fn explain_query(
        &self,
        text: &str,
        resolved_query: &Value,
        collection: &str,
    ) -> Result<QueryExplanationRecord, GatewayError> {
        self.explainer
            .explain_query(text, resolved_query, collection)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
