//! Saved-vehicle handlers. Mounted behind the login gate.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use motors_core::store::StoreError;
use motors_core::validation::{VehicleRef, parse_id};
use serde_json::json;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::FormOrJson;
use crate::handlers::back_or;
use crate::middleware::identity::CurrentIdentity;
use crate::middleware::negotiate::ResponseFormat;
use crate::services::session::Session;
use crate::views::Page;

/// The favorites list page.
pub const FAVORITES: &str = "/account/favorites";

const SAVED: &str = "Saved to your favorites.";
const REMOVED: &str = "Removed from your favorites.";
const INVALID_VEHICLE: &str = "Invalid vehicle.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Add,
    Remove,
}

/// Outcome of a favorites write, negotiated like the rest of the site.
fn reply(
    session: &Session,
    format: ResponseFormat,
    headers: &HeaderMap,
    status: StatusCode,
    message: &str,
) -> Response {
    match format {
        ResponseFormat::Json => (
            status,
            Json(json!({ "ok": status.is_success(), "message": message })),
        )
            .into_response(),
        ResponseFormat::Html => {
            session.push_notice(message);
            Redirect::to(&back_or(headers, FAVORITES)).into_response()
        }
    }
}

async fn apply(
    state: &AppState,
    current: &CurrentIdentity,
    session: &Session,
    format: ResponseFormat,
    headers: &HeaderMap,
    raw_id: &str,
    change: Option<Change>,
) -> AppResult<Response> {
    let identity = current.require()?;
    let Some(inv_id) = parse_id(raw_id) else {
        return Ok(reply(session, format, headers, StatusCode::BAD_REQUEST, INVALID_VEHICLE));
    };

    let change = match change {
        Some(change) => change,
        None => {
            if state.favorites.contains(identity.sub, inv_id).await? {
                Change::Remove
            } else {
                Change::Add
            }
        }
    };

    let message = match change {
        Change::Add => match state.favorites.add(identity.sub, inv_id).await {
            Ok(()) => SAVED,
            Err(StoreError::NotFound(_)) => {
                return Ok(reply(session, format, headers, StatusCode::NOT_FOUND, INVALID_VEHICLE));
            }
            Err(e) => return Err(e.into()),
        },
        Change::Remove => {
            state.favorites.remove(identity.sub, inv_id).await?;
            REMOVED
        }
    };
    tracing::debug!(account_id = identity.sub, inv_id, ?change, "favorites changed");
    Ok(reply(session, format, headers, StatusCode::OK, message))
}

/// `GET /account/favorites`
pub async fn list(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
) -> AppResult<Response> {
    let identity = current.require()?;
    let items = state.favorites.list(identity.sub).await?;
    Ok(Page::new("My Saved Vehicles")
        .notices(session.take_notices())
        .data(json!({ "items": items }))
        .render(format))
}

/// `POST /account/favorites/add`
pub async fn add(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
    headers: HeaderMap,
    FormOrJson(input): FormOrJson<VehicleRef>,
) -> AppResult<Response> {
    apply(&state, &current, &session, format, &headers, &input.inv_id, Some(Change::Add)).await
}

/// `POST /account/favorites/remove`
pub async fn remove(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
    headers: HeaderMap,
    FormOrJson(input): FormOrJson<VehicleRef>,
) -> AppResult<Response> {
    apply(&state, &current, &session, format, &headers, &input.inv_id, Some(Change::Remove)).await
}

/// `POST /account/favorites/toggle` — `action` of `add`/`remove` forces a
/// direction; otherwise the current state is flipped.
pub async fn toggle(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
    headers: HeaderMap,
    FormOrJson(input): FormOrJson<VehicleRef>,
) -> AppResult<Response> {
    let change = match input.action.as_deref().map(str::trim) {
        Some(a) if a.eq_ignore_ascii_case("add") => Some(Change::Add),
        Some(a) if a.eq_ignore_ascii_case("remove") => Some(Change::Remove),
        _ => None,
    };
    apply(&state, &current, &session, format, &headers, &input.inv_id, change).await
}
