//! Authentication and authorization logic.
//!
//! Provides password hashing and signed identity tokens shared by the
//! HTTP layer.

pub mod jwt;
pub mod password;

use thiserror::Error;

pub use jwt::{TokenCodec, parse_ttl};

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Signing key is not configured")]
    MissingSigningKey,

    #[error("Invalid token lifetime: {0}")]
    InvalidTtl(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a presented token was not accepted.
///
/// Callers resolving request identity collapse every variant to "anonymous";
/// the distinction only exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("token expired")]
    Expired,

    #[error("token signature mismatch")]
    SignatureMismatch,

    #[error("signing key is not configured")]
    MissingSigningKey,
}
