//! Error codes shared by the record server and its clients
//!
//! The server renders every failure as an [`ApiResponse`](crate::response::ApiResponse)
//! carrying one of these codes; clients map the code back to a typed error.

use http::StatusCode;

/// Wire codes carried in `ApiResponse::code`
pub mod codes {
    pub const SUCCESS: &str = "E0000";
    pub const VALIDATION: &str = "E0002";
    pub const NOT_FOUND: &str = "E0003";
    pub const FORBIDDEN: &str = "E2001";
    pub const UNAUTHORIZED: &str = "E3001";
    pub const INVALID_TOKEN: &str = "E3002";
    pub const TOKEN_EXPIRED: &str = "E3003";
    pub const INTERNAL: &str = "E9001";
    pub const DATABASE: &str = "E9002";
}

/// Standard API error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Success
    Success,
    /// Validation error (400)
    Validation,
    /// Authentication required (401)
    Unauthorized,
    /// Invalid token (401)
    InvalidToken,
    /// Token expired (401)
    TokenExpired,
    /// Permission denied (403)
    Forbidden,
    /// Resource not found (404)
    NotFound,
    /// Internal server error (500)
    Internal,
    /// Database error (500)
    Database,
}

impl ApiErrorCode {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the default message for this error
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Validation => "Validation failed",
            Self::Unauthorized => "Please sign in first",
            Self::InvalidToken => "Invalid token",
            Self::TokenExpired => "Token expired",
            Self::Forbidden => "Permission denied",
            Self::NotFound => "Resource not found",
            Self::Internal => "Internal server error",
            Self::Database => "Database error",
        }
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Success => codes::SUCCESS,
            Self::Validation => codes::VALIDATION,
            Self::Unauthorized => codes::UNAUTHORIZED,
            Self::InvalidToken => codes::INVALID_TOKEN,
            Self::TokenExpired => codes::TOKEN_EXPIRED,
            Self::Forbidden => codes::FORBIDDEN,
            Self::NotFound => codes::NOT_FOUND,
            Self::Internal => codes::INTERNAL,
            Self::Database => codes::DATABASE,
        }
    }

    /// Parse a wire code; unknown codes yield `None`
    pub fn from_code(code: &str) -> Option<Self> {
        let parsed = match code {
            codes::SUCCESS => Self::Success,
            codes::VALIDATION => Self::Validation,
            codes::UNAUTHORIZED => Self::Unauthorized,
            codes::INVALID_TOKEN => Self::InvalidToken,
            codes::TOKEN_EXPIRED => Self::TokenExpired,
            codes::FORBIDDEN => Self::Forbidden,
            codes::NOT_FOUND => Self::NotFound,
            codes::INTERNAL => Self::Internal,
            codes::DATABASE => Self::Database,
            _ => return None,
        };
        Some(parsed)
    }

    /// Whether the code means the caller has no valid identity
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::InvalidToken | Self::TokenExpired
        )
    }
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ApiErrorCode::Validation,
            ApiErrorCode::Unauthorized,
            ApiErrorCode::TokenExpired,
            ApiErrorCode::NotFound,
            ApiErrorCode::Database,
        ] {
            assert_eq!(ApiErrorCode::from_code(code.code()), Some(code));
        }
        assert_eq!(ApiErrorCode::from_code("E4242"), None);
    }

    #[test]
    fn test_only_emitted_codes_resolve() {
        // conflict and invalid-state codes are never produced by the record server
        assert_eq!(ApiErrorCode::from_code("E0004"), None);
        assert_eq!(ApiErrorCode::from_code("E0006"), None);
    }

    #[test]
    fn test_auth_codes_map_to_401() {
        for code in [
            ApiErrorCode::Unauthorized,
            ApiErrorCode::InvalidToken,
            ApiErrorCode::TokenExpired,
        ] {
            assert!(code.is_auth());
            assert_eq!(code.status_code(), StatusCode::UNAUTHORIZED);
        }
        assert!(!ApiErrorCode::NotFound.is_auth());
    }
}
