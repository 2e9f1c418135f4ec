//! Data models
//!
//! Shared between record-server and form clients (via API).

pub mod doc_no;
pub mod document;
pub mod form;
pub mod record_key;

// Re-exports
pub use doc_no::*;
pub use document::*;
pub use form::*;
pub use record_key::*;
