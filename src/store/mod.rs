//! Persistent record storage.
//!
//! The store owns a single collection of [`Record`]s. Every operation is one
//! awaitable request/response pair backed by exactly one storage transaction;
//! nothing is batched across calls.

mod schema;
mod sqlite;

pub use sqlite::SqliteRecordStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{NewRecord, Record, RecordId};

/// Failures reported by a record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  /// The database could not be opened; nothing else will work
  #[error("storage unavailable: {0}")]
  Unavailable(String),
  #[error("read failed: {0}")]
  Read(String),
  #[error("write failed: {0}")]
  Write(String),
  /// Update targeted an id that is not stored. Counts as a write failure.
  #[error("record {0} does not exist")]
  NotFound(RecordId),
}

/// Async access to the record collection.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
  /// Store a new record and return the id assigned to it.
  async fn add(&self, record: NewRecord) -> Result<RecordId, StoreError>;

  /// All records in primary-key order.
  async fn list(&self) -> Result<Vec<Record>, StoreError>;

  /// A single record by id.
  async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError>;

  /// Replace the fields of an existing record. Fails with
  /// [`StoreError::NotFound`] when the id is not stored.
  async fn update(&self, record: Record) -> Result<(), StoreError>;

  /// Remove a record. Removing an absent id succeeds.
  async fn delete(&self, id: RecordId) -> Result<(), StoreError>;
}
