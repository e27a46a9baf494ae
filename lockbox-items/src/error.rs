//! Error types for item operations.

use crate::actions::DisabledReason;
use lockbox_storage::StorageError;
use lockbox_types::{ItemKey, ShareId};
use thiserror::Error;

/// Result type for item operations.
pub type ItemResult<T> = Result<T, ItemError>;

/// Errors that can occur in item operations.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The item does not exist at this address.
    #[error("item not found: {0}")]
    NotFound(ItemKey),

    /// The share (vault) is unknown locally.
    #[error("share not found: {0}")]
    ShareNotFound(ShareId),

    /// Another writer changed the item first. Refetch and retry.
    #[error("stale revision for {key}: expected {expected}, stored {actual}")]
    StaleRevision {
        key: ItemKey,
        expected: u64,
        actual: u64,
    },

    /// A sync is running over the affected shares.
    #[error("sync in progress")]
    SyncInProgress,

    /// The action is not allowed for this item.
    #[error("permission denied: {0}")]
    PermissionDenied(DisabledReason),

    /// A collaborator (encryption, remote sync) failed.
    #[error("{operation} failed: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl ItemError {
    pub(crate) fn upstream(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Upstream {
            operation,
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for ItemError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ItemNotFound(key) => Self::NotFound(key),
            StorageError::ShareNotFound(share_id) => Self::ShareNotFound(share_id),
            StorageError::StaleRevision {
                key,
                expected,
                actual,
            } => Self::StaleRevision {
                key,
                expected,
                actual,
            },
            other => Self::Storage(other),
        }
    }
}
