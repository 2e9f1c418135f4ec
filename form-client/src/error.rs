//! Client error types

use form_capture::ImageProcessingError;
use shared::ApiErrorCode;
use thiserror::Error;

/// Transport-level error talking to the record server
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Missing, invalid or expired identity
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Server-side failure
    #[error("Server error: {0}")]
    Server(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Map an error envelope from the server
    pub fn from_api(code: &str, message: String) -> Self {
        match ApiErrorCode::from_code(code) {
            Some(c) if c.is_auth() => Self::Unauthorized(message),
            Some(ApiErrorCode::Forbidden) => Self::Forbidden(message),
            Some(ApiErrorCode::NotFound) => Self::NotFound(message),
            Some(ApiErrorCode::Validation) => Self::Validation(message),
            _ => Self::Server(format!("{code}: {message}")),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Form-level outcome errors
///
/// Store and identity failures reach the session, which turns them into
/// user-visible notices. Draft failures never show up here.
#[derive(Debug, Error)]
pub enum FormError {
    /// Neither `PI` nor `SN` in the page URL
    #[error("No PI or SN given; this form cannot be saved")]
    KeyMissing,

    #[error("Sign-in failed: {0}")]
    Auth(String),

    #[error("Image processing failed: {0}")]
    Image(#[from] ImageProcessingError),

    #[error("Failed to load record: {0}")]
    StoreRead(String),

    #[error("Failed to save record: {0}")]
    StoreWrite(String),
}

impl FormError {
    /// Load failure; identity problems stay identity problems
    pub fn read(e: ClientError) -> Self {
        if e.is_auth() {
            Self::Auth(e.to_string())
        } else {
            Self::StoreRead(e.to_string())
        }
    }

    /// Save or issue failure
    pub fn write(e: ClientError) -> Self {
        if e.is_auth() {
            Self::Auth(e.to_string())
        } else {
            Self::StoreWrite(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_codes() {
        assert!(ClientError::from_api("E3003", "Token expired".into()).is_auth());
        assert!(matches!(
            ClientError::from_api("E0003", "Record PI_1".into()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_api("E9002", "Database error".into()),
            ClientError::Server(_)
        ));
        assert!(matches!(
            ClientError::from_api("E0002", "bad date".into()),
            ClientError::Validation(_)
        ));
    }

    #[test]
    fn test_auth_failures_stay_auth() {
        let err = FormError::read(ClientError::Unauthorized("expired".into()));
        assert!(matches!(err, FormError::Auth(_)));
        let err = FormError::write(ClientError::Server("E9002: Database error".into()));
        assert!(matches!(err, FormError::StoreWrite(_)));
    }
}
