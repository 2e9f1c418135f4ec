//! In-process doubles for the store, auth and draft seams

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use shared::RecordDocument;
use shared::models::{DocShard, RecordKey};

use crate::clock::ManualClock;
use crate::context::StorageContext;
use crate::draft::{DraftBackend, DraftError, DraftStore};
use crate::identity::{AuthBackend, IdentityGate, Principal};
use crate::store::RecordStore;
use crate::{ClientError, ClientResult};

#[derive(Default)]
pub struct FakeAuth {
    calls: AtomicUsize,
    fail_first: usize,
    delay: Option<Duration>,
}

impl FakeAuth {
    pub fn slow() -> Self {
        Self {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        }
    }

    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Default::default()
        }
    }

    pub fn sign_ins(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn sign_in_anonymously(&self) -> ClientResult<Principal> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if n <= self.fail_first {
            return Err(ClientError::Server("auth backend down".into()));
        }
        Ok(Principal {
            uid: format!("uid-{n}"),
            token: format!("token-{n}"),
            expires_at: i64::MAX,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Load(String),
    Save(String),
    Issue(String),
}

/// Record store keeping documents in a map, with the server's merge rules
#[derive(Default)]
pub struct FakeStore {
    docs: Mutex<HashMap<String, serde_json::Map<String, serde_json::Value>>>,
    counters: Mutex<HashMap<String, u64>>,
    calls: Mutex<Vec<StoreCall>>,
    fail_loads: Mutex<bool>,
    rejected_tokens: Mutex<Vec<String>>,
    load_delay: Option<Duration>,
}

impl FakeStore {
    pub fn with_load_delay(delay: Duration) -> Self {
        Self {
            load_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn insert(&self, key: &str, doc: serde_json::Value) {
        if let serde_json::Value::Object(map) = doc {
            self.docs.lock().insert(key.to_string(), map);
        }
    }

    pub fn get(&self, key: &str) -> Option<RecordDocument> {
        let doc = self.docs.lock().get(key).cloned()?;
        serde_json::from_value(serde_json::Value::Object(doc)).ok()
    }

    pub fn fail_loads(&self) {
        *self.fail_loads.lock() = true;
    }

    /// Answer calls carrying `token` the way the server answers a bad bearer
    pub fn reject_token(&self, token: &str) {
        self.rejected_tokens.lock().push(token.to_string());
    }

    fn authorize(&self, principal: &Principal) -> ClientResult<()> {
        if self.rejected_tokens.lock().contains(&principal.token) {
            return Err(ClientError::Unauthorized("Invalid token".into()));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn saves(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, StoreCall::Save(_)))
            .count()
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn load(
        &self,
        principal: &Principal,
        key: &RecordKey,
    ) -> ClientResult<Option<RecordDocument>> {
        self.calls.lock().push(StoreCall::Load(key.to_string()));
        self.authorize(principal)?;
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_loads.lock() {
            return Err(ClientError::Server("E9002: Database error".into()));
        }
        Ok(self.get(key.as_str()))
    }

    async fn save(
        &self,
        principal: &Principal,
        key: &RecordKey,
        document: &RecordDocument,
    ) -> ClientResult<RecordDocument> {
        self.calls.lock().push(StoreCall::Save(key.to_string()));
        self.authorize(principal)?;
        let serde_json::Value::Object(patch) = serde_json::to_value(document)? else {
            return Err(ClientError::Validation("not an object".into()));
        };
        let mut docs = self.docs.lock();
        let stored = docs.entry(key.to_string()).or_default();
        stored.extend(patch);
        stored.insert("key".into(), key.as_str().into());
        stored.insert("updatedAt".into(), shared::util::server_timestamp().into());
        Ok(serde_json::from_value(serde_json::Value::Object(stored.clone()))?)
    }

    async fn issue_doc_no(
        &self,
        principal: &Principal,
        issue_date: NaiveDate,
    ) -> ClientResult<String> {
        let shard = DocShard::from_date(issue_date);
        self.calls.lock().push(StoreCall::Issue(shard.to_string()));
        self.authorize(principal)?;
        let mut counters = self.counters.lock();
        let seq = counters.entry(shard.to_string()).or_insert(0);
        *seq += 1;
        Ok(shard.doc_no(*seq))
    }
}

/// Draft backend that counts physical writes
#[derive(Default)]
pub struct CountingBackend {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    fail_writes: bool,
}

impl CountingBackend {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }
}

impl DraftBackend for CountingBackend {
    fn read(&self, name: &str) -> Result<Option<String>, DraftError> {
        Ok(self.entries.lock().get(name).cloned())
    }

    fn write(&self, name: &str, value: &str) -> Result<(), DraftError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(DraftError::Serialization(serde_json::Error::io(
                std::io::Error::other("quota exceeded"),
            )));
        }
        self.entries
            .lock()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), DraftError> {
        self.entries.lock().remove(name);
        Ok(())
    }
}

pub fn context(store: Arc<FakeStore>, auth: Arc<FakeAuth>) -> StorageContext {
    StorageContext::new(Arc::new(IdentityGate::new(auth)), store)
}

pub fn drafts() -> (Arc<DraftStore>, Arc<CountingBackend>, Arc<ManualClock>) {
    let backend = Arc::new(CountingBackend::default());
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(DraftStore::new(backend.clone(), clock.clone()));
    (store, backend, clock)
}
