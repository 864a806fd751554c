//! Record store adapter.
//!
//! The workflow only talks to [`RecordStore`]; the PostgreSQL implementation
//! backs production and the in-process document collection backs local
//! development and the tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::features::records::models::{NewRecord, Record, RecordFields, RecordFilter};

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Enumerates errors returned by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached at all
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The store was reached but the operation failed
    #[error("record store query failed: {0}")]
    Query(String),

    /// A stored record could not be decoded
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(e.to_string())
            }
            _ => StoreError::Query(e.to_string()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A collection of records. Every write is durable once the call returns.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record and return its newly assigned id
    async fn insert(&self, record: NewRecord) -> StoreResult<Uuid>;

    /// Overwrite the editable fields of a record. A `None` password keeps
    /// the stored one. Returns `false` when no record has this id.
    async fn update_by_id(&self, id: Uuid, fields: &RecordFields) -> StoreResult<bool>;

    /// Remove a record, returning how many were deleted (0 or 1)
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<u64>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Record>>;

    async fn count(&self, filter: &RecordFilter) -> StoreResult<u64>;

    /// Records matching `filter` in creation order, skipping `skip` and
    /// returning at most `limit`
    async fn find_page(
        &self,
        filter: &RecordFilter,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<Record>>;

    /// Release any connections held by the store
    async fn close(&self) {}
}
