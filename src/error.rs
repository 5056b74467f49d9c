//! Gateway error taxonomy.
//!
//! Authentication and access-control failures are hard errors that abort
//! the request before anything else runs. Analysis and persistence failures
//! are soft: they degrade observability but never request correctness.
//! The transport collaborator maps [`GatewayError::status_code`] onto its
//! own wire format.

use thiserror::Error;

/// Token verification failure, produced by the identity seam.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Token is malformed, has a bad signature, or carries unusable claims.
    #[error("invalid token")]
    InvalidToken,
    /// Token was valid once but its expiry has passed.
    #[error("token expired")]
    Expired,
}

/// All caller-visible failures of the gateway core.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 401-equivalent: the caller could not be identified.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// 403-equivalent: identified, but the role lacks collection access or
    /// the query text matched a restricted-operation pattern.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// 408-equivalent, produced exclusively by the timeout guard.
    /// Downstream work is not cancelled.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Execution-plan or index-catalog lookup failed. Fails explanation
    /// generation, never the underlying query.
    #[error("query analysis failed: {0}")]
    Analysis(#[source] anyhow::Error),

    /// Audit or explanation write failed. Logged, never surfaced on the
    /// response path; reads of stored entries can still report it.
    #[error("persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl GatewayError {
    /// HTTP-equivalent status for the transport collaborator.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Auth(_) => 401,
            GatewayError::AccessDenied(_) => 403,
            GatewayError::Timeout(_) => 408,
            GatewayError::Analysis(_) | GatewayError::Persistence(_) => 500,
        }
    }
}
