//! Local draft store
//!
//! Keeps the latest form snapshot per record key on the client so an
//! interrupted session can resume. Writes are throttled per key and every
//! failure is logged and swallowed: drafts are a convenience, never a
//! reason to interrupt the user.
//!
//! # Storage
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `drafts` | `draft:<recordKey>` | JSON `FormRecord` |

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use redb::{Database, ReadableDatabase, TableDefinition};
use shared::FormRecord;
use shared::models::DRAFT_PREFIX;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::throttle::Throttle;

/// Minimum spacing of physical writes per key
pub const DRAFT_WRITE_WINDOW: Duration = Duration::from_millis(600);

const DRAFTS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("drafts");

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw key/value persistence for drafts
pub trait DraftBackend: Send + Sync {
    fn read(&self, name: &str) -> Result<Option<String>, DraftError>;
    fn write(&self, name: &str, value: &str) -> Result<(), DraftError>;
    fn remove(&self, name: &str) -> Result<(), DraftError>;
}

/// Drafts in a local redb file
#[derive(Clone)]
pub struct RedbDraftBackend {
    db: Arc<Database>,
}

impl RedbDraftBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DraftError> {
        Self::init(Database::create(path)?)
    }

    /// In-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, DraftError> {
        Self::init(
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?,
        )
    }

    fn init(db: Database) -> Result<Self, DraftError> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DRAFTS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl DraftBackend for RedbDraftBackend {
    fn read(&self, name: &str) -> Result<Option<String>, DraftError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRAFTS_TABLE)?;
        Ok(table.get(name)?.map(|guard| guard.value().to_string()))
    }

    fn write(&self, name: &str, value: &str) -> Result<(), DraftError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DRAFTS_TABLE)?;
            table.insert(name, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), DraftError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DRAFTS_TABLE)?;
            table.remove(name)?;
        }
        txn.commit()?;
        Ok(())
    }
}

/// Throttled per-key snapshot cache
///
/// An empty record key makes every operation a no-op.
pub struct DraftStore {
    backend: Arc<dyn DraftBackend>,
    clock: Arc<dyn Clock>,
    window: Duration,
    pending: Mutex<HashMap<String, Throttle<FormRecord>>>,
}

impl DraftStore {
    pub fn new(backend: Arc<dyn DraftBackend>, clock: Arc<dyn Clock>) -> Self {
        Self::with_window(backend, clock, DRAFT_WRITE_WINDOW)
    }

    pub fn with_window(
        backend: Arc<dyn DraftBackend>,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> Self {
        Self {
            backend,
            clock,
            window,
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn draft_name(key: &str) -> String {
        format!("{DRAFT_PREFIX}{key}")
    }

    /// Last stored snapshot; unreadable or absent drafts yield `None`
    pub fn restore(&self, key: &str) -> Option<FormRecord> {
        if key.is_empty() {
            return None;
        }
        let name = Self::draft_name(key);
        let raw = match self.backend.read(&name) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "draft read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "draft unreadable, ignoring");
                None
            }
        }
    }

    /// Schedule a snapshot write; coalesced per key
    pub fn persist(&self, key: &str, record: &FormRecord) {
        if key.is_empty() {
            return;
        }
        let now = self.clock.now();
        let mut pending = self.pending.lock();
        pending
            .entry(key.to_string())
            .or_insert_with(|| Throttle::new(self.window))
            .offer(now, record.clone());
    }

    /// Remove the snapshot and any pending write
    pub fn discard(&self, key: &str) {
        if key.is_empty() {
            return;
        }
        if let Some(throttle) = self.pending.lock().get_mut(key) {
            throttle.cancel();
        }
        if let Err(e) = self.backend.remove(&Self::draft_name(key)) {
            tracing::warn!(key = %key, error = %e, "draft discard failed");
        }
    }

    /// Write every pending snapshot whose window has closed
    ///
    /// Returns the number of physical writes attempted.
    pub fn tick(&self) -> usize {
        let now = self.clock.now();
        self.drain(|throttle| throttle.take_due(now))
    }

    /// Write every pending snapshot now
    pub fn flush(&self) -> usize {
        self.drain(Throttle::take_now)
    }

    /// Whether a write for `key` is waiting
    pub fn has_pending(&self, key: &str) -> bool {
        self.pending
            .lock()
            .get(key)
            .is_some_and(Throttle::is_pending)
    }

    fn drain(&self, mut take: impl FnMut(&mut Throttle<FormRecord>) -> Option<FormRecord>) -> usize {
        let due: Vec<(String, FormRecord)> = {
            let mut pending = self.pending.lock();
            let due = pending
                .iter_mut()
                .filter_map(|(key, throttle)| take(throttle).map(|record| (key.clone(), record)))
                .collect();
            pending.retain(|_, throttle| throttle.is_pending());
            due
        };

        for (key, record) in &due {
            self.write(key, record);
        }
        due.len()
    }

    fn write(&self, key: &str, record: &FormRecord) {
        let result = serde_json::to_string(record)
            .map_err(DraftError::from)
            .and_then(|json| self.backend.write(&Self::draft_name(key), &json));
        match result {
            Ok(()) => tracing::debug!(key = %key, "draft saved"),
            Err(e) => tracing::warn!(key = %key, error = %e, "draft write failed"),
        }
    }
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore")
            .field("window", &self.window)
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

/// Drive [`DraftStore::tick`] from a timer until `shutdown` fires, then flush
pub fn spawn_draft_flusher(
    store: Arc<DraftStore>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    let written = store.flush();
                    tracing::debug!(written, "draft flusher stopped");
                    break;
                }
                _ = interval.tick() => {
                    store.tick();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::CountingBackend;

    fn record(part_name: &str) -> FormRecord {
        FormRecord {
            key: "PI_1".into(),
            part_name: part_name.into(),
            ..Default::default()
        }
    }

    fn store() -> (DraftStore, Arc<CountingBackend>, Arc<ManualClock>) {
        let backend = Arc::new(CountingBackend::default());
        let clock = Arc::new(ManualClock::new());
        let store = DraftStore::new(backend.clone(), clock.clone());
        (store, backend, clock)
    }

    #[test]
    fn test_round_trip_after_window() {
        let (store, _, clock) = store();
        store.persist("PI_1", &record("Bracket"));
        assert!(store.restore("PI_1").is_none());

        clock.advance(DRAFT_WRITE_WINDOW);
        assert_eq!(store.tick(), 1);
        assert_eq!(store.restore("PI_1"), Some(record("Bracket")));
    }

    #[test]
    fn test_coalesces_within_window() {
        let (store, backend, clock) = store();
        store.persist("PI_1", &record("A"));
        clock.advance(Duration::from_millis(200));
        store.persist("PI_1", &record("B"));
        clock.advance(Duration::from_millis(399));
        assert_eq!(store.tick(), 0);

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.tick(), 1);
        assert_eq!(store.tick(), 0);
        assert_eq!(backend.writes(), 1);
        assert_eq!(store.restore("PI_1").unwrap().part_name, "B");
    }

    #[test]
    fn test_keys_are_independent() {
        let (store, backend, clock) = store();
        store.persist("PI_1", &record("one"));
        store.persist("SN2", &record("two"));
        clock.advance(DRAFT_WRITE_WINDOW);
        assert_eq!(store.tick(), 2);
        assert_eq!(backend.writes(), 2);
        assert_eq!(store.restore("SN2").unwrap().part_name, "two");
        assert!(backend.contains("draft:SN2"));
    }

    #[test]
    fn test_flush_writes_pending_immediately() {
        let (store, backend, _) = store();
        store.persist("PI_1", &record("A"));
        assert!(store.has_pending("PI_1"));
        assert_eq!(store.flush(), 1);
        assert!(!store.has_pending("PI_1"));
        assert_eq!(backend.writes(), 1);
    }

    #[test]
    fn test_discard_drops_snapshot_and_pending_write() {
        let (store, _, clock) = store();
        store.persist("PI_1", &record("A"));
        store.flush();
        store.persist("PI_1", &record("B"));
        store.discard("PI_1");

        clock.advance(DRAFT_WRITE_WINDOW);
        assert_eq!(store.tick(), 0);
        assert!(store.restore("PI_1").is_none());
    }

    #[test]
    fn test_empty_key_is_inert() {
        let (store, backend, clock) = store();
        store.persist("", &record("A"));
        clock.advance(DRAFT_WRITE_WINDOW);
        assert_eq!(store.flush(), 0);
        assert!(store.restore("").is_none());
        store.discard("");
        assert_eq!(backend.writes(), 0);
    }

    #[test]
    fn test_corrupt_draft_is_ignored() {
        let (store, backend, _) = store();
        backend.write("draft:PI_1", "{not json").unwrap();
        assert!(store.restore("PI_1").is_none());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let backend = Arc::new(CountingBackend::failing());
        let store = DraftStore::new(backend.clone(), Arc::new(ManualClock::new()));
        store.persist("PI_1", &record("A"));
        assert_eq!(store.flush(), 1);
        assert!(store.restore("PI_1").is_none());
    }

    #[test]
    fn test_redb_backend_round_trip() {
        let backend = RedbDraftBackend::open_in_memory().unwrap();
        assert_eq!(backend.read("draft:PI_1").unwrap(), None);
        backend.write("draft:PI_1", "{}").unwrap();
        assert_eq!(backend.read("draft:PI_1").unwrap().as_deref(), Some("{}"));
        backend.remove("draft:PI_1").unwrap();
        assert_eq!(backend.read("draft:PI_1").unwrap(), None);
    }

    #[test]
    fn test_redb_backend_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.redb");
        {
            let store = DraftStore::new(
                Arc::new(RedbDraftBackend::open(&path).unwrap()),
                Arc::new(ManualClock::new()),
            );
            store.persist("PI_1", &record("Valve"));
            store.flush();
        }
        let store = DraftStore::new(
            Arc::new(RedbDraftBackend::open(&path).unwrap()),
            Arc::new(ManualClock::new()),
        );
        assert_eq!(store.restore("PI_1").unwrap().part_name, "Valve");
    }

    #[tokio::test]
    async fn test_flusher_writes_and_flushes_on_shutdown() {
        let backend = Arc::new(CountingBackend::default());
        let store = Arc::new(DraftStore::new(
            backend.clone(),
            Arc::new(crate::clock::SystemClock::new()),
        ));
        let shutdown = CancellationToken::new();
        let handle = spawn_draft_flusher(store.clone(), Duration::from_millis(100), shutdown.clone());

        store.persist("PI_1", &record("A"));
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(backend.writes(), 1);
        assert_eq!(store.restore("PI_1").unwrap().part_name, "A");
    }
}
