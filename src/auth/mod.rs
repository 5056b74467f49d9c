//! Caller identity and permission resolution.
//!
//! Provides:
//! - Bearer-token verification (`token` submodule — the identity seam)
//! - Role grants and the cached permission store (`permissions` submodule)

pub mod permissions;
pub mod token;

pub use permissions::{PermissionStore, PolicyConfig, Role, RoleGrant};
pub use token::{Claims, JwtVerifier, TokenVerifier};
