//! Record Routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/records/{key} | GET | Load a stored document |
//! | /api/records/{key} | PATCH | Merge-write a document |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/records/{key}",
        get(handler::get_record).patch(handler::merge_record),
    )
}
