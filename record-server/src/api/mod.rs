//! HTTP API
//!
//! - [`health`] - liveness
//! - [`auth`] - anonymous sign-in
//! - [`records`] - form documents
//! - [`doc_counters`] - document numbers

pub mod auth;
pub mod doc_counters;
pub mod health;
pub mod records;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(records::router())
        .merge(doc_counters::router())
}

/// Routes with middleware, used by the server and by oneshot tests
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // Bearer token check, runs before every handler
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        // Forms are opened from a browser on another origin
        .layer(CorsLayer::permissive())
}
