//! Unified error handling
//!
//! [`AppError`] is returned by every handler and middleware and renders as
//! the shared [`ApiResponse`] envelope.
//!
//! # Error codes
//!
//! | Prefix | Category | Example |
//! |--------|----------|---------|
//! | E0xxx | Request errors | E0003 not found |
//! | E2xxx | Permission errors | E2001 forbidden |
//! | E3xxx | Identity errors | E3001 not signed in |
//! | E9xxx | System errors | E9002 database error |
//!
//! # Example
//!
//! ```ignore
//! Err(AppError::not_found(format!("Record {key}")))
//!
//! Ok(ok(document))
//! ```

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::{ApiErrorCode, ApiResponse};
use tracing::error;

use crate::records::StorageError;

/// Application error
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Identity errors (401) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Request errors (4xx) ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== System errors (5xx) ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Shared error code for this error
    pub fn code(&self) -> ApiErrorCode {
        match self {
            AppError::Unauthorized => ApiErrorCode::Unauthorized,
            AppError::TokenExpired => ApiErrorCode::TokenExpired,
            AppError::InvalidToken(_) => ApiErrorCode::InvalidToken,
            AppError::Forbidden(_) => ApiErrorCode::Forbidden,
            AppError::NotFound(_) => ApiErrorCode::NotFound,
            AppError::Validation(_) => ApiErrorCode::Validation,
            AppError::Database(_) => ApiErrorCode::Database,
            AppError::Internal(_) => ApiErrorCode::Internal,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            AppError::Unauthorized | AppError::TokenExpired | AppError::InvalidToken(_) => {
                code.default_message().to_string()
            }
            AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                code.default_message().to_string()
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                code.default_message().to_string()
            }
        };

        let body = Json(ApiResponse::<()>::error(code.code(), message));
        (code.status_code(), body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidDocument(msg) => AppError::Validation(msg),
            StorageError::InvalidShard(e) => AppError::Validation(e.to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok_with_message(data, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (AppError::unauthorized(), StatusCode::UNAUTHORIZED, "E3001"),
            (AppError::invalid_token("bad"), StatusCode::UNAUTHORIZED, "E3002"),
            (AppError::token_expired(), StatusCode::UNAUTHORIZED, "E3003"),
            (AppError::not_found("Record PI_1"), StatusCode::NOT_FOUND, "E0003"),
            (AppError::validation("bad date"), StatusCode::BAD_REQUEST, "E0002"),
            (
                AppError::Database("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "E9002",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.code().code(), code);
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_storage_validation_is_client_error() {
        let err: AppError = StorageError::InvalidDocument("evalResult".into()).into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
