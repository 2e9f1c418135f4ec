//! Authentication Routes

mod handler;

use axum::{Router, routing::post};

use crate::auth::middleware::ANONYMOUS_SIGN_IN_PATH;
use crate::core::ServerState;

/// `/api/auth/anonymous` is public, the auth middleware lets it through
pub fn router() -> Router<ServerState> {
    Router::new().route(ANONYMOUS_SIGN_IN_PATH, post(handler::sign_in_anonymously))
}
