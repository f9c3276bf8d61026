//! JWT token generation and verification.
//!
//! Tokens are HS256 JWTs carrying an [`Identity`] plus `iat`/`exp`. The key
//! is held by a [`TokenCodec`] built once from configuration; a codec built
//! without a key refuses to sign and verifies every token to
//! [`TokenError::MissingSigningKey`].

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::{AuthError, TokenError};
use crate::models::account::{Identity, Role};

/// Accepted clock skew on expiry checks, in seconds.
pub const DEFAULT_LEEWAY_SECS: u64 = 5;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: &str = "1h";

/// Longest lifetime `parse_ttl` accepts.
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Wire claims: identity plus registered time claims.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: i32,
    name: String,
    email: String,
    role: Role,
    iat: i64,
    exp: i64,
}

impl TokenClaims {
    fn into_identity(self) -> Identity {
        Identity {
            sub: self.sub,
            name: self.name,
            email: self.email,
            role: self.role,
        }
    }
}

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies identity tokens with a server-held HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    keys: Option<Keys>,
    leeway_secs: u64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("has_key", &self.keys.is_some())
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl TokenCodec {
    /// Build a codec. A missing or blank secret yields a keyless codec.
    pub fn new(secret: Option<&str>, leeway_secs: u64) -> Self {
        let keys = secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Keys {
                encoding: EncodingKey::from_secret(s.as_bytes()),
                decoding: DecodingKey::from_secret(s.as_bytes()),
            });
        Self { keys, leeway_secs }
    }

    /// Whether a signing key is configured.
    pub fn has_key(&self) -> bool {
        self.keys.is_some()
    }

    /// Sign `identity` into a token valid for `ttl` from now.
    pub fn sign(&self, identity: &Identity, ttl: Duration) -> Result<String, AuthError> {
        self.sign_at(identity, ttl, Utc::now())
    }

    fn sign_at(
        &self,
        identity: &Identity,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::MissingSigningKey)?;
        if ttl <= Duration::zero() {
            return Err(AuthError::InvalidTtl(format!("{}s", ttl.num_seconds())));
        }
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::InvalidTtl(format!("{}s", ttl.num_seconds())))?;
        let claims = TokenClaims {
            sub: identity.sub,
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    /// Verify a token, returning the embedded identity on success.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let keys = self.keys.as_ref().ok_or(TokenError::MissingSigningKey)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Malformed);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        decode::<TokenClaims>(token, &keys.decoding, &validation)
            .map(|data| data.claims.into_identity())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                _ => TokenError::Malformed,
            })
    }
}

/// Parse a token lifetime such as `"1h"`, `"30m"`, `"45s"`, `"7d"`.
///
/// A bare number is taken as seconds. Zero, negative and values longer than
/// [`MAX_TOKEN_TTL_DAYS`] are rejected.
pub fn parse_ttl(raw: &str) -> Result<Duration, AuthError> {
    let s = raw.trim();
    let invalid = || AuthError::InvalidTtl(raw.to_string());

    let (digits, unit) = match s.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&s[..idx], Some(c.to_ascii_lowercase())),
        Some(_) => (s, None),
        None => return Err(invalid()),
    };
    let n: i64 = digits.trim().parse().map_err(|_| invalid())?;
    if n <= 0 {
        return Err(invalid());
    }

    let ttl = match unit {
        None | Some('s') => Duration::try_seconds(n),
        Some('m') => Duration::try_minutes(n),
        Some('h') => Duration::try_hours(n),
        Some('d') => Duration::try_days(n),
        Some(_) => None,
    };
    ttl.filter(|t| *t <= Duration::days(MAX_TOKEN_TTL_DAYS))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity {
            sub: 1,
            name: "Happy".into(),
            email: "manager@340.edu".into(),
            role: Role::Admin,
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(Some("test-secret"), DEFAULT_LEEWAY_SECS)
    }

    #[test]
    fn sign_then_verify_returns_same_identity() {
        let codec = codec();
        let token = codec.sign(&admin(), parse_ttl("1h").unwrap()).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), admin());
    }

    #[test]
    fn payload_carries_only_identity_and_time_claims() {
        let codec = codec();
        let token = codec.sign(&admin(), Duration::hours(1)).unwrap();

        let data = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        let obj = data.claims.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["email", "exp", "iat", "name", "role", "sub"]);
        assert_eq!(obj["sub"], 1);
        assert_eq!(obj["role"], "Admin");
    }

    #[test]
    fn expired_within_leeway_still_verifies() {
        let codec = codec();
        let ttl = Duration::minutes(10);
        // exp lands 2s in the past; leeway is 5s.
        let issued = Utc::now() - ttl - Duration::seconds(2);
        let token = codec.sign_at(&admin(), ttl, issued).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), admin());
    }

    #[test]
    fn expired_beyond_leeway_is_rejected() {
        let codec = codec();
        let ttl = Duration::minutes(10);
        let issued = Utc::now() - ttl - Duration::seconds(10);
        let token = codec.sign_at(&admin(), ttl, issued).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn zero_leeway_rejects_just_expired() {
        let codec = TokenCodec::new(Some("test-secret"), 0);
        let ttl = Duration::seconds(30);
        let issued = Utc::now() - ttl - Duration::seconds(2);
        let token = codec.sign_at(&admin(), ttl, issued).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let other = TokenCodec::new(Some("some-other-secret"), DEFAULT_LEEWAY_SECS);
        let token = other.sign(&admin(), Duration::hours(1)).unwrap();
        assert_eq!(codec().verify(&token), Err(TokenError::SignatureMismatch));
    }

    #[test]
    fn garbage_is_rejected_without_panicking() {
        let codec = codec();
        for junk in ["", "   ", "not-a-token", "a.b.c", "eyJ.eyJ.sig", "\u{1F697}.\u{0}.x"] {
            assert_eq!(codec.verify(junk), Err(TokenError::Malformed), "input: {junk:?}");
        }
    }

    #[test]
    fn keyless_codec_cannot_sign() {
        let codec = TokenCodec::new(None, DEFAULT_LEEWAY_SECS);
        assert!(!codec.has_key());
        assert!(matches!(
            codec.sign(&admin(), Duration::hours(1)),
            Err(AuthError::MissingSigningKey)
        ));
    }

    #[test]
    fn keyless_codec_verifies_nothing() {
        let token = codec().sign(&admin(), Duration::hours(1)).unwrap();
        let keyless = TokenCodec::new(Some("   "), DEFAULT_LEEWAY_SECS);
        assert_eq!(keyless.verify(&token), Err(TokenError::MissingSigningKey));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        assert!(matches!(
            codec().sign(&admin(), Duration::zero()),
            Err(AuthError::InvalidTtl(_))
        ));
    }

    #[test]
    fn ttl_past_the_calendar_is_an_error_not_a_panic() {
        let result = codec().sign(&admin(), Duration::days(1_000_000_000));
        assert!(matches!(result, Err(AuthError::InvalidTtl(_))));
    }

    #[test]
    fn parse_ttl_units() {
        assert_eq!(parse_ttl("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_ttl("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_ttl("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_ttl("7D").unwrap(), Duration::days(7));
        assert_eq!(parse_ttl("3600").unwrap(), Duration::hours(1));
        assert_eq!(parse_ttl("365d").unwrap(), Duration::days(MAX_TOKEN_TTL_DAYS));
    }

    #[test]
    fn parse_ttl_rejects_bad_input() {
        for bad in ["", "h", "0h", "-5m", "1w", "1.5h", "abc", "366d", "100000000d"] {
            assert!(parse_ttl(bad).is_err(), "input: {bad:?}");
        }
    }
}
