//! Storage context shared by the reconciler

use std::sync::Arc;

use crate::ClientResult;
use crate::config::ClientConfig;
use crate::http::HttpClient;
use crate::identity::{HttpAuthBackend, IdentityGate};
use crate::store::{HttpRecordStore, RecordStore};

/// Identity gate and record store, built once per client
#[derive(Clone)]
pub struct StorageContext {
    pub identity: Arc<IdentityGate>,
    pub records: Arc<dyn RecordStore>,
}

impl StorageContext {
    pub fn new(identity: Arc<IdentityGate>, records: Arc<dyn RecordStore>) -> Self {
        Self { identity, records }
    }

    /// Context talking to the record server; one `reqwest::Client` for both
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let http = HttpClient::new(config)?;
        let identity = IdentityGate::new(Arc::new(HttpAuthBackend::new(http.clone())));
        Ok(Self::new(
            Arc::new(identity),
            Arc::new(HttpRecordStore::new(http)),
        ))
    }
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
