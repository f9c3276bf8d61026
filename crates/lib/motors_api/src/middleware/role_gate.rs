//! Role-based route gating.
//!
//! A [`RoleGate`] lists the roles admitted to a group of routes. Anonymous
//! callers and callers with any other role are turned away: API clients get
//! a JSON 401/403, browsers get a flash notice and a redirect to the login
//! page, with the original location remembered for after login.

use std::sync::Arc;

use axum::Json;
use axum::extract::{OriginalUri, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use motors_core::models::{Role, UnknownRole};
use serde_json::json;
use tracing::debug;

use crate::middleware::identity::CurrentIdentity;
use crate::middleware::negotiate::ResponseFormat;
use crate::services::session::Session;

/// Where browsers are sent when a gate turns them away.
pub const LOGIN_PATH: &str = "/account/login";

/// Notice for anonymous callers.
pub const LOGIN_REQUIRED: &str = "Please log in to continue.";

/// Notice for callers whose role is not admitted.
pub const NOT_AUTHORIZED: &str = "You are not authorized to view that page.";

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

impl Denial {
    pub fn status(self) -> StatusCode {
        match self {
            Denial::Unauthenticated => StatusCode::UNAUTHORIZED,
            Denial::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Denial::Unauthenticated => LOGIN_REQUIRED,
            Denial::Forbidden => NOT_AUTHORIZED,
        }
    }
}

/// Outcome of checking a caller against a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(Denial),
}

/// The set of roles admitted to a route group.
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: Arc<[Role]>,
}

impl RoleGate {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut allowed: Vec<Role> = Vec::new();
        for role in roles {
            if !allowed.contains(&role) {
                allowed.push(role);
            }
        }
        Self {
            allowed: allowed.into(),
        }
    }

    /// Build from role names, compared case-insensitively.
    pub fn from_names<I, S>(names: I) -> Result<Self, UnknownRole>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = names
            .into_iter()
            .map(|n| n.as_ref().parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(roles))
    }

    /// Any logged-in caller.
    pub fn authenticated() -> Self {
        Self::new(Role::ALL)
    }

    /// Inventory staff.
    pub fn staff() -> Self {
        Self::new([Role::Employee, Role::Admin])
    }

    pub fn allowed(&self) -> &[Role] {
        &self.allowed
    }

    pub fn admits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    pub fn decide(&self, current: &CurrentIdentity) -> GateDecision {
        match current.role() {
            None => GateDecision::Deny(Denial::Unauthenticated),
            Some(role) if self.admits(role) => GateDecision::Allow,
            Some(_) => GateDecision::Deny(Denial::Forbidden),
        }
    }
}

/// Axum middleware enforcing a [`RoleGate`]; install with
/// `axum::middleware::from_fn_with_state(gate, role_gate::enforce)`.
pub async fn enforce(State(gate): State<RoleGate>, request: Request, next: Next) -> Response {
    let current = request
        .extensions()
        .get::<CurrentIdentity>()
        .cloned()
        .unwrap_or_default();

    let denial = match gate.decide(&current) {
        GateDecision::Allow => return next.run(request).await,
        GateDecision::Deny(denial) => denial,
    };

    let format = request
        .extensions()
        .get::<ResponseFormat>()
        .copied()
        .unwrap_or_else(|| ResponseFormat::from_headers(request.headers()));
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|u| &u.0)
        .unwrap_or(request.uri())
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".into());

    debug!(
        path = %path,
        role = ?current.role(),
        allowed = ?gate.allowed(),
        ?denial,
        "route gate denied request"
    );

    if format.is_json() {
        let body = json!({ "ok": false, "message": denial.message() });
        return (denial.status(), Json(body)).into_response();
    }

    match request.extensions().get::<Session>() {
        Some(session) => {
            if request.method() == Method::GET {
                session.set_return_to(path);
            }
            session.push_notice(denial.message());
        }
        None => tracing::warn!("route gate running without a session"),
    }
    Redirect::to(LOGIN_PATH).into_response()
}
