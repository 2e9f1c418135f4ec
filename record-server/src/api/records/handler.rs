//! Record Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Map, Value};
use shared::ApiResponse;

use crate::auth::CurrentPrincipal;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};

/// Load the document stored under `key`
///
/// A missing document is a 404 with code `E0003`.
pub async fn get_record(
    State(state): State<ServerState>,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<Map<String, Value>>>> {
    let record = state
        .storage
        .get_record(&key)?
        .ok_or_else(|| AppError::not_found(format!("Record {key}")))?;
    Ok(ok(record))
}

/// Merge the body into the document stored under `key`
///
/// Returns the stored document including the server `updatedAt`.
pub async fn merge_record(
    State(state): State<ServerState>,
    Extension(principal): Extension<CurrentPrincipal>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<Json<ApiResponse<Map<String, Value>>>> {
    if key.trim().is_empty() {
        return Err(AppError::validation("Record key must not be empty"));
    }
    let Value::Object(patch) = body else {
        return Err(AppError::validation("Record body must be a JSON object"));
    };

    let fields = patch.len();
    let merged = state.storage.merge_record(&key, patch)?;
    tracing::info!(key = %key, uid = %principal.uid, fields, "record saved");
    Ok(ok(merged))
}
