//! Anonymous sign-in

use axum::{Json, extract::State};
use shared::{AnonymousSession, ApiResponse};
use uuid::Uuid;

use crate::core::ServerState;
use crate::security_log;
use crate::utils::{AppError, AppResult, ok};

/// Mint a fresh anonymous principal and its bearer token
pub async fn sign_in_anonymously(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<AnonymousSession>>> {
    let uid = Uuid::new_v4().to_string();
    let issued = state
        .jwt_service
        .generate_token(&uid)
        .map_err(|e| AppError::internal(e.to_string()))?;

    security_log!("INFO", "anonymous_sign_in", uid = uid.clone());

    Ok(ok(AnonymousSession {
        uid,
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}
