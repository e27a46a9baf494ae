//! Encrypted item store for lockbox.
//!
//! Holds the local cache of `ItemEncrypted` records and the shares they live
//! in, behind the [`ItemStore`] trait. Two implementations are provided:
//!
//! - [`MemoryItemStore`]: process-local, used by tests and ephemeral sessions
//! - [`SqliteItemStore`]: persistent, backed by SQLite
//!
//! # Concurrency
//!
//! Reads may run concurrently. Writes to an existing item go through
//! [`ItemStore::compare_and_swap`]: the writer names the revision it based
//! its change on, and the write fails with [`StorageError::StaleRevision`]
//! if the stored revision moved on in the meantime. There is no global write
//! lock spanning several items.
//!
//! # Observation
//!
//! Every committed write bumps a change counter published on a
//! `tokio::sync::watch` channel. [`observe_items`] turns that into a stream
//! of query results that re-runs the query after each change.

mod error;
mod memory;
mod observe;
mod query;
mod sqlite;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryItemStore;
pub use observe::{observe_items, ItemStream};
pub use query::{listing_order, ItemQuery};
pub use sqlite::SqliteItemStore;

use async_trait::async_trait;
use lockbox_types::{ItemEncrypted, ItemKey, ShareId, ShareRecord};
use tokio::sync::watch;

/// Read/write contract of the encrypted item cache.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Inserts or replaces a share record.
    async fn upsert_share(&self, share: ShareRecord) -> StorageResult<()>;

    async fn get_share(&self, share_id: &ShareId) -> StorageResult<Option<ShareRecord>>;

    async fn shares(&self) -> StorageResult<Vec<ShareRecord>>;

    /// Removes a share together with all of its items. Returns the number of
    /// items removed.
    async fn remove_share(&self, share_id: &ShareId) -> StorageResult<usize>;

    /// Stores items received from the server.
    ///
    /// Items are addressed by `(share_id, item_id)`; the same item id may
    /// be cached once per share that exposes it. The batch is rejected as a
    /// whole with `StaleRevision` if any incoming item is older than the
    /// cached copy at the same key.
    async fn upsert_items(&self, items: Vec<ItemEncrypted>) -> StorageResult<()>;

    async fn get_item(&self, key: &ItemKey) -> StorageResult<Option<ItemEncrypted>>;

    /// Items matching `query`, in [`listing_order`].
    async fn query_items(&self, query: &ItemQuery) -> StorageResult<Vec<ItemEncrypted>>;

    /// Replaces the item at `key` with `updated` if its stored revision is
    /// still `expected_revision`.
    ///
    /// `updated` must carry the same item id and a higher revision; it may
    /// name a different share, in which case the item leaves `key` and
    /// lands at its new key in one step. Moving onto a key that is already
    /// occupied fails with `ItemExists`.
    async fn compare_and_swap(
        &self,
        key: &ItemKey,
        expected_revision: u64,
        updated: ItemEncrypted,
    ) -> StorageResult<()>;

    /// Permanently deletes the item at `key` if its stored revision is
    /// still `expected_revision`.
    async fn delete_item(&self, key: &ItemKey, expected_revision: u64) -> StorageResult<()>;

    /// Change counter, bumped after every committed write.
    fn subscribe_changes(&self) -> watch::Receiver<u64>;
}

/// Checks a compare-and-swap against the currently stored copy.
pub(crate) fn check_swap(
    key: &ItemKey,
    current: Option<&ItemEncrypted>,
    expected_revision: u64,
    updated: Option<&ItemEncrypted>,
) -> StorageResult<()> {
    let current = current.ok_or(StorageError::ItemNotFound(*key))?;

    if current.revision != expected_revision {
        return Err(StorageError::StaleRevision {
            key: *key,
            expected: expected_revision,
            actual: current.revision,
        });
    }

    if let Some(updated) = updated {
        if updated.id != key.item_id || updated.revision <= expected_revision {
            return Err(StorageError::InvalidRevision {
                key: *key,
                expected: expected_revision,
                proposed: updated.revision,
            });
        }
    }
    Ok(())
}

/// Checks that an incoming server copy is not older than the cached one.
pub(crate) fn check_incoming(
    current: Option<&ItemEncrypted>,
    incoming: &ItemEncrypted,
) -> StorageResult<()> {
    match current {
        Some(current) if current.revision > incoming.revision => Err(StorageError::StaleRevision {
            key: incoming.key(),
            expected: incoming.revision,
            actual: current.revision,
        }),
        _ => Ok(()),
    }
}
