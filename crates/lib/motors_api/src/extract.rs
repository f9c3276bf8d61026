//! Request body extraction.

use axum::extract::{Form, FromRequest, Json, Request};
use axum::http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Accepts either a JSON body or an urlencoded form, by `Content-Type`.
#[derive(Debug, Clone)]
pub struct FormOrJson<T>(pub T);

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
}

impl<S, T> FromRequest<S> for FormOrJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&request) {
            let Json(value) = Json::<T>::from_request(request, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(request, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(Self(value))
        }
    }
}
