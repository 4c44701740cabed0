//! Bearer token authentication for Hail.
//!
//! This crate provides:
//! - HS256 JWT validation (and issuance, for tools and tests)
//! - The authenticated caller's [`Identity`]

mod error;
mod identity;
mod jwt;

pub use error::*;
pub use identity::*;
pub use jwt::*;

/// Default JWT expiration time in hours.
pub const DEFAULT_JWT_EXPIRATION_HOURS: u64 = 24;

/// Default JWT issuer.
pub const DEFAULT_JWT_ISSUER: &str = "hail";
