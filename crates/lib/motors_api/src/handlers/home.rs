//! Home page and fallback.

use axum::extract::State;
use axum::response::Response;
use serde_json::json;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::identity::CurrentIdentity;
use crate::middleware::negotiate::ResponseFormat;
use crate::services::session::Session;
use crate::views::Page;

/// `GET /` — landing page with the classification navigation.
pub async fn home(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
) -> AppResult<Response> {
    let classifications = state.inventory.classifications().await?;
    Ok(Page::new("Home")
        .notices(session.take_notices())
        .data(json!({
            "classifications": classifications,
            "account": current.identity(),
        }))
        .render(format))
}

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Sorry, we appear to have lost that page.".into())
}
