//! Document Counter Routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/doc-counters/issue | POST | Issue the next doc number for a date |
//! | /api/doc-counters/{shard} | GET | Current counter of a `YYYYMMDD` shard |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/doc-counters/issue", post(handler::issue))
        .route("/api/doc-counters/{shard}", get(handler::get_counter))
}
