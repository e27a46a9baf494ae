//! Error types for the storage layer.

use lockbox_types::{ItemKey, ShareId};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No item at this share/item address.
    #[error("item not found: {0}")]
    ItemNotFound(ItemKey),

    /// No share with this id.
    #[error("share not found: {0}")]
    ShareNotFound(ShareId),

    /// Optimistic-concurrency conflict: the stored revision is not the one
    /// the writer based its change on.
    #[error("stale revision for {key}: expected {expected}, stored {actual}")]
    StaleRevision {
        key: ItemKey,
        expected: u64,
        actual: u64,
    },

    /// A move into a share that already holds a copy of the item.
    #[error("item already exists: {0}")]
    ItemExists(ItemKey),

    /// A write that does not advance the revision, or targets another item.
    #[error("invalid write for {key}: revision {proposed} does not follow {expected}")]
    InvalidRevision {
        key: ItemKey,
        expected: u64,
        proposed: u64,
    },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data read back from storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    /// A blocking storage task failed to complete.
    #[error("storage task failed: {0}")]
    TaskJoin(String),
}
