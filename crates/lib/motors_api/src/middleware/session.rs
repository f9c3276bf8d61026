//! Session middleware.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::{SESSION_COOKIE, session_cookie};
use crate::services::session::{Session, generate_session_id};

/// Axum middleware: attaches a [`Session`] handle to every request.
///
/// An unknown or expired `motors_sid` is replaced with a fresh id; the
/// cookie is only sent once the handler has written to the session.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let store = Arc::clone(&state.sessions);
    let existing = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|id| store.contains(id));

    let (id, fresh) = match existing {
        Some(id) => {
            store.touch(&id);
            (id, false)
        }
        None => (generate_session_id(), true),
    };

    request
        .extensions_mut()
        .insert(Session::new(id.clone(), Arc::clone(&store)));
    let mut response = next.run(request).await;

    if fresh && store.contains(&id) {
        let cookie = session_cookie(&id, state.config.auth.secure_cookies);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "session cookie not encodable"),
        }
    }
    response
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session middleware not installed".into()))
    }
}
