//! Document Counter Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ApiResponse;
use shared::models::{DocCounterView, DocShard, IssueDocNoRequest, IssuedDocNo};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};

/// Issue the next document number for `issueDate`
pub async fn issue(
    State(state): State<ServerState>,
    Json(req): Json<IssueDocNoRequest>,
) -> AppResult<Json<ApiResponse<IssuedDocNo>>> {
    let issued = state.storage.issue_doc_no(&req.issue_date)?;
    tracing::info!(doc_no = %issued.doc_no, shard = %issued.shard, "doc number issued");
    Ok(ok(issued))
}

pub async fn get_counter(
    State(state): State<ServerState>,
    Path(shard): Path<String>,
) -> AppResult<Json<ApiResponse<DocCounterView>>> {
    let shard = DocShard::parse(&shard).map_err(|e| AppError::validation(e.to_string()))?;
    let counter = state.storage.get_counter(&shard)?;
    Ok(ok(DocCounterView {
        shard: shard.to_string(),
        seq: counter.seq,
        updated_at: counter.updated_at,
    }))
}
