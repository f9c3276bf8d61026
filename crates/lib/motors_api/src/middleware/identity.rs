//! Identity resolution.
//!
//! Runs on every request and never rejects: a missing, malformed, expired or
//! foreign token simply leaves the caller anonymous.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use motors_core::auth::{TokenCodec, TokenError};
use motors_core::models::{Identity, Role};
use tracing::{debug, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::cookies::JWT_COOKIE;

/// Who is making the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CurrentIdentity {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl CurrentIdentity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, CurrentIdentity::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            CurrentIdentity::Authenticated(identity) => Some(identity),
            CurrentIdentity::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|i| i.role)
    }

    /// The identity, or `Unauthorized` for anonymous callers.
    pub fn require(&self) -> AppResult<&Identity> {
        self.identity()
            .ok_or_else(|| AppError::Unauthorized("Please log in to continue.".into()))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(char::is_whitespace)?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// The presented token: the `jwt` cookie first, then `Authorization: Bearer`.
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(JWT_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(headers))
}

/// Resolve the caller from request headers.
pub fn resolve(codec: &TokenCodec, headers: &HeaderMap) -> CurrentIdentity {
    let Some(token) = presented_token(headers) else {
        return CurrentIdentity::Anonymous;
    };
    match codec.verify(&token) {
        Ok(identity) => CurrentIdentity::Authenticated(identity),
        Err(TokenError::MissingSigningKey) => {
            warn!("token presented but no signing key is configured");
            CurrentIdentity::Anonymous
        }
        Err(reason) => {
            debug!(%reason, "token rejected");
            CurrentIdentity::Anonymous
        }
    }
}

/// Axum middleware: verifies any presented token and stores a
/// [`CurrentIdentity`] in request extensions.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let current = resolve(&state.codec, request.headers());
    request.extensions_mut().insert(current);
    next.run(request).await
}

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .unwrap_or_default())
    }
}
