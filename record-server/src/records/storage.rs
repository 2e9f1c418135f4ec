//! redb-based storage for form records and document counters
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `records` | record key | JSON object | Stored form documents |
//! | `doc_counters` | `YYYYMMDD` shard | JSON `DocCounter` | Per-day document sequence |
//!
//! # Atomicity
//!
//! redb allows a single write transaction at a time. Merge-writes and
//! counter increments do their read and write inside one write transaction,
//! so concurrent callers are serialized and never observe the same counter
//! value.

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde_json::{Map, Value};
use shared::models::{DocCounter, DocNoError, DocShard, IssuedDocNo, RecordDocument};
use shared::util::server_timestamp;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Stored documents: key = record key, value = JSON object
const RECORDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// 单号计数器: key = shard (YYYYMMDD), value = JSON 序列化的 DocCounter
const DOC_COUNTERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("doc_counters");

/// Field the server always overwrites with the path key
const KEY_FIELD: &str = "key";

/// Field stamped on every write
const UPDATED_AT_FIELD: &str = "updatedAt";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
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

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    InvalidShard(#[from] DocNoError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Record storage backed by redb
#[derive(Clone)]
pub struct RecordStorage {
    db: Arc<Database>,
}

impl RecordStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS_TABLE)?;
            let _ = write_txn.open_table(DOC_COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // ========== Records ==========

    /// Load a stored document as a raw JSON object
    pub fn get_record(&self, key: &str) -> StorageResult<Option<Map<String, Value>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS_TABLE)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Merge `patch` into the stored document and return the result
    ///
    /// Top-level fields missing from `patch` keep their stored value. The
    /// stored `key` is always the path key and `updatedAt` is refreshed.
    /// A merged document that does not read back as a form document is
    /// rejected and nothing is written.
    pub fn merge_record(
        &self,
        key: &str,
        patch: Map<String, Value>,
    ) -> StorageResult<Map<String, Value>> {
        let txn = self.db.begin_write()?;
        let merged = Self::merge_in_txn(&txn, key, patch)?;
        txn.commit()?;
        Ok(merged)
    }

    fn merge_in_txn(
        txn: &WriteTransaction,
        key: &str,
        patch: Map<String, Value>,
    ) -> StorageResult<Map<String, Value>> {
        let mut table = txn.open_table(RECORDS_TABLE)?;
        let mut merged: Map<String, Value> = match table.get(key)? {
            Some(guard) => serde_json::from_slice(guard.value())?,
            None => Map::new(),
        };

        for (field, value) in patch {
            merged.insert(field, value);
        }
        merged.insert(KEY_FIELD.to_string(), Value::String(key.to_string()));
        merged.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::String(server_timestamp()),
        );

        serde_json::from_value::<RecordDocument>(Value::Object(merged.clone()))
            .map_err(|e| StorageError::InvalidDocument(e.to_string()))?;

        let bytes = serde_json::to_vec(&merged)?;
        table.insert(key, bytes.as_slice())?;
        Ok(merged)
    }

    // ========== Document counters ==========

    /// Issue the next document number for the given issue date
    pub fn issue_doc_no(&self, issue_date: &str) -> StorageResult<IssuedDocNo> {
        let shard = DocShard::parse(issue_date)?;

        // 读-加一-写在同一个写事务内完成，redb 写事务串行执行
        let txn = self.db.begin_write()?;
        let next = {
            let mut table = txn.open_table(DOC_COUNTERS_TABLE)?;
            let current = match table.get(shard.as_str())? {
                Some(guard) => serde_json::from_slice::<DocCounter>(guard.value())?.seq,
                None => 0,
            };
            let next = current + 1;
            let counter = DocCounter {
                seq: next,
                updated_at: Some(Utc::now()),
            };
            let bytes = serde_json::to_vec(&counter)?;
            table.insert(shard.as_str(), bytes.as_slice())?;
            next
        };
        txn.commit()?;

        Ok(IssuedDocNo {
            doc_no: shard.doc_no(next),
            shard: shard.to_string(),
            seq: next,
        })
    }

    /// Current counter of a shard (seq 0 when nothing was issued yet)
    pub fn get_counter(&self, shard: &DocShard) -> StorageResult<DocCounter> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOC_COUNTERS_TABLE)?;
        match table.get(shard.as_str())? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(DocCounter::default()),
        }
    }
}
