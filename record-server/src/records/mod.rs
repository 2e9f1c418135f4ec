//! Form record persistence
//!
//! - [`RecordStorage`] - redb tables for documents and doc counters

pub mod storage;

pub use storage::{RecordStorage, StorageError, StorageResult};
