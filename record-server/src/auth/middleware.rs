//! 认证中间件
//!
//! 为匿名 JWT 认证和项目校验提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppError;
use crate::auth::{CurrentPrincipal, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Header carrying the client's project id
pub const PROJECT_ID_HEADER: &str = "x-project-id";

/// Anonymous sign-in, reachable without a token
pub const ANONYMOUS_SIGN_IN_PATH: &str = "/api/auth/anonymous";

/// 认证中间件 - 要求有效的匿名令牌
///
/// Extracts the JWT from `Authorization: Bearer <token>` and injects a
/// [`CurrentPrincipal`] into the request extensions.
///
/// # Skipped paths
///
/// - `OPTIONS *` (CORS preflight)
/// - non `/api/` paths (`/health`)
/// - `/api/auth/anonymous`
///
/// When the server has a project id configured, every `/api/` request must
/// carry it in `X-Project-Id`.
///
/// # Errors
///
/// | Case | Code |
/// |------|------|
/// | Wrong project | 403 E2001 |
/// | No Authorization header | 401 E3001 |
/// | Malformed or forged token | 401 E3002 |
/// | Expired token | 401 E3003 |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if let Some(expected) = state.config.project_id.as_deref() {
        let given = req
            .headers()
            .get(PROJECT_ID_HEADER)
            .and_then(|h| h.to_str().ok());
        if given != Some(expected) {
            security_log!(
                "WARN",
                "project_mismatch",
                given = given.unwrap_or("").to_string(),
                uri = req.uri().to_string()
            );
            return Err(AppError::forbidden("Unknown project"));
        }
    }

    if path == ANONYMOUS_SIGN_IN_PATH {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::unauthorized());
        }
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            let principal = CurrentPrincipal::from(claims);
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().to_string()
            );

            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}
