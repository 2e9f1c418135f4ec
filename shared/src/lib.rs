//! Shared types for the cleanroom import form
//!
//! Form data model, wire documents, error codes and the response envelope
//! used by both record-server and form-client.

pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiErrorCode, codes};
pub use models::{
    AnonymousSession, DocCounter, DocShard, EvalResult, FormRecord, QueryParams, RecordDocument,
    RecordKey, SignatureSlot, TriState,
};
pub use response::ApiResponse;
