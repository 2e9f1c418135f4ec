//! Form Client - cleanroom import form against the record server
//!
//! Holds the state of one open form and keeps it in sync with two stores:
//! the record server (explicit saves, doc numbers) and a local draft
//! store (debounced autosave).

pub mod clock;
pub mod config;
pub mod context;
pub mod draft;
pub mod error;
pub mod http;
pub mod identity;
pub mod reconciler;
pub mod session;
pub mod store;
pub mod throttle;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use context::StorageContext;
pub use draft::{
    DRAFT_WRITE_WINDOW, DraftBackend, DraftError, DraftStore, RedbDraftBackend,
    spawn_draft_flusher,
};
pub use error::{ClientError, ClientResult, FormError};
pub use http::HttpClient;
pub use identity::{AuthBackend, HttpAuthBackend, IdentityGate, Principal};
pub use reconciler::{BootOutcome, BootSource, Reconciler, SaveReport};
pub use session::{
    BootStatus, ChoiceField, DateField, FormCommand, FormSession, Notice, TextField, page_params,
};
pub use store::{HttpRecordStore, RecordStore};
