//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Client errors are reported in
//! the response envelope (`code` `"400"`, `"401"`, ...) with HTTP 200, which is
//! what the app expects. Server errors are captured to Sentry and answered
//! with HTTP 500 and a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use mall_core::TransitionError;

use crate::db::RepositoryError;
use crate::envelope::Envelope;
use crate::services::auth::AuthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller does not own the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or state conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource not found".to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl AppError {
    /// Envelope code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Internal(_) => "500",
            Self::Auth(err) => match err {
                AuthError::InvalidAccount(_) | AuthError::InvalidPassword(_) => "400",
                AuthError::InvalidCredentials | AuthError::InvalidToken => "401",
                AuthError::Disabled => "403",
                AuthError::AccountExists(_) => "409",
                AuthError::Repository(_) | AuthError::PasswordHash => "500",
            },
            Self::BadRequest(_) => "400",
            Self::Unauthorized(_) => "401",
            Self::Forbidden(_) => "403",
            Self::NotFound(_) => "404",
            Self::Conflict(_) => "409",
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
        )
    }

    /// Message shown to the client. Server-side details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Auth(err) => match err {
                AuthError::InvalidAccount(e) => e.to_string(),
                AuthError::InvalidPassword(e) => e.to_string(),
                AuthError::InvalidCredentials => "Invalid account or password".to_owned(),
                AuthError::AccountExists(what) => format!("This {what} is already registered"),
                AuthError::Disabled => "This account has been disabled".to_owned(),
                AuthError::InvalidToken => "Unauthorized, please log in again".to_owned(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_owned()
                }
            },
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
            StatusCode::OK
        };

        let body = Envelope::failure(self.code(), self.client_message());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Shorthand for a `BadRequest` naming a missing field.
pub fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!("{field} is required"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use mall_core::OrderStatus;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("goods 7".to_string());
        assert_eq!(err.to_string(), "Not found: goods 7");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[tokio::test]
    async fn test_client_errors_use_envelope_codes() {
        for (err, code) in [
            (AppError::BadRequest("x".to_owned()), "400"),
            (AppError::Unauthorized("x".to_owned()), "401"),
            (AppError::Forbidden("x".to_owned()), "403"),
            (AppError::NotFound("x".to_owned()), "404"),
            (AppError::Conflict("x".to_owned()), "409"),
            (AppError::Auth(AuthError::Disabled), "403"),
            (AppError::Auth(AuthError::AccountExists("email")), "409"),
        ] {
            let (status, body) = render(err).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["code"], code);
            assert_eq!(body["data"], serde_json::Value::Null);
        }
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = render(AppError::Internal("disk on fire".to_owned())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "500");
        assert_eq!(body["msg"], "Internal server error");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(AppError::from(RepositoryError::NotFound).code(), "404");
        assert_eq!(
            AppError::from(RepositoryError::Conflict("dup".to_owned())).code(),
            "409"
        );
        let transition = OrderStatus::Completed.cancel().unwrap_err();
        assert_eq!(AppError::from(transition).code(), "400");
    }
}
