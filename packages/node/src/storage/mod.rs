//! Storage abstraction layer for the recall service.
//!
//! The [`Storage`] trait is the contract between the HTTP handlers and
//! persistence. Records are grouped by entity type and keyed by id; storage
//! knows nothing about wire formats, filtering or computed fields.
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStorage`] | Tests, conformance suite, ephemeral services |
//!
//! [`MemoryStorage`]: memory::MemoryStorage

pub mod memory;

use async_trait::async_trait;
use recallwire::{EntityId, Record};

/// Errors that storage operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested record does not exist.
    #[error("not found")]
    NotFound,

    /// A record with the same type and id already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An unexpected error in the underlying storage backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// The persistence contract for the service.
///
/// Implementations must be `Send + Sync + 'static` so they can be held in
/// an `Arc<dyn Storage>`.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Persist a new record. Returns [`StorageError::Conflict`] if a record
    /// of the same type with the same id already exists.
    async fn insert(&self, record: &Record) -> Result<(), StorageError>;

    /// Persist several new records at once. Either every record is stored
    /// or none is: a conflict with stored data, or between two records of
    /// the batch, fails the whole call.
    async fn insert_all(&self, records: &[Record]) -> Result<(), StorageError>;

    /// Replace an existing record. Returns [`StorageError::NotFound`] if it
    /// was never inserted.
    async fn update(&self, record: &Record) -> Result<(), StorageError>;

    async fn get(&self, entity_type: &str, id: &EntityId) -> Result<Option<Record>, StorageError>;

    /// Remove a record. Returns [`StorageError::NotFound`] if absent.
    async fn delete(&self, entity_type: &str, id: &EntityId) -> Result<(), StorageError>;

    /// All records of a type, ordered by id.
    ///
    /// Generated ids are UUIDv7, so this is creation order for records the
    /// service created itself.
    async fn list(&self, entity_type: &str) -> Result<Vec<Record>, StorageError>;

    async fn count(&self, entity_type: &str) -> Result<usize, StorageError>;
}
