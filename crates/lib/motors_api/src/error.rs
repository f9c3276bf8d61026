//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use motors_core::auth::AuthError;
use motors_core::store::StoreError;
use motors_core::validation::ValidationErrors;
use serde::Serialize;
use thiserror::Error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// JSON error body: `{ "ok": false, "error": "...", "message": "..." }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    pub message: String,
}

/// Attached to error responses so the negotiation layer can re-render them
/// as a page for browsers.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub status: StatusCode,
    pub message: String,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database unavailable: {0}")]
    DbUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DbUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Internal details are never exposed.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::Validation(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m) => m,
            AppError::DbUnavailable(_) => "Service temporarily unavailable",
            AppError::Internal(_) => "Internal server error",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::DbUnavailable(_) => "db_unavailable",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(detail) | AppError::DbUnavailable(detail) => {
                tracing::error!(status = status.as_u16(), %detail, "request failed");
            }
            _ => tracing::debug!(status = status.as_u16(), error = %self, "request rejected"),
        }

        let message = self.public_message().to_string();
        let body = Json(ErrorBody {
            ok: false,
            error: self.code().to_string(),
            message: message.clone(),
        });
        let mut response = (status, body).into_response();
        response
            .extensions_mut()
            .insert(ErrorInfo { status, message });
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::DbUnavailable(e.to_string())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => {
                AppError::Conflict("That email is already registered. Please log in.".into())
            }
            StoreError::DuplicateClassification(name) => {
                AppError::Conflict(format!("Classification \"{name}\" already exists."))
            }
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::DbError(e) => AppError::from(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => {
                AppError::Unauthorized("Please check your credentials and try again.".into())
            }
            AuthError::TokenError(msg) => AppError::Unauthorized(msg),
            AuthError::InvalidTtl(msg) => AppError::Internal(msg),
            AuthError::MissingSigningKey => {
                AppError::Internal("token signing key is not configured".into())
            }
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn error_body_shape() {
        let response = AppError::Forbidden("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.extensions().get::<ErrorInfo>().is_some());
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "forbidden");
        assert_eq!(json["message"], "nope");
    }

    #[tokio::test]
    async fn internal_detail_is_hidden() {
        let response = AppError::Internal("connection refused at 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(!json["message"].as_str().unwrap().contains("10.0.0.3"));
    }

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(AppError::from(StoreError::DuplicateEmail).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(StoreError::NotFound("vehicle".into())).status(),
            StatusCode::NOT_FOUND
        );
    }
}
