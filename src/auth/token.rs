//! Bearer-token verification using HS256 JWTs.
//!
//! The gateway only verifies tokens; minting them is the identity
//! collaborator's job. `encode_jwt` exists for that collaborator and for
//! tests. Expired tokens are distinguished from all other failures so the
//! transport can report them separately.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::permissions::Role;
use crate::error::AuthError;

/// JWT claims payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — opaque caller id
    pub sub: String,
    /// Declared role, resolved to a grant by the permission store
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Verifies a bearer token and extracts the caller's identity claims.
///
/// Seam for the external identity collaborator; the JWT implementation
/// below is the default.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 JWT verifier backed by a shared secret.
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken,
        })
    }
}

/// Encode a JWT for the given subject and role.
///
/// Uses HS256 signing with the provided secret.
pub fn encode_jwt(
    subject: &str,
    role: Role,
    secret: &str,
    expiry_secs: u64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        role,
        iat: now,
        exp: now + expiry_secs as i64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("failed to encode JWT: {e}"))
}

// ============================================================================
// Tests
// ============================================================================
