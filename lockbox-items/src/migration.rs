//! Moving items between vaults.
//!
//! Each item move is committed on its own through the store's
//! compare-and-swap, which changes the share pointer and the revision in one
//! step. A failed move never undoes earlier ones; every failure is reported
//! per item in [`MigrateItemsResult`] so a retry can be scoped to the items
//! that did not move. Re-migrating an item that already sits in the
//! destination succeeds without touching it.

use crate::access::{AccessProvider, ShareAccess};
use crate::actions::DisabledReason;
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::{ItemError, ItemResult};
use lockbox_crypto::{EncryptionProvider, EncryptionTag};
use lockbox_storage::{ItemQuery, ItemStore, StorageError};
use lockbox_sync::SyncStatusTracker;
use lockbox_types::{
    EncryptedBlob, ItemEncrypted, ItemId, ItemKey, ItemState, ShareId, ShareSelection,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a single item did not move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum MigrationFailure {
    #[error("item not found")]
    NotFound,
    #[error("stale revision: expected {expected}, stored {actual}")]
    StaleRevision { expected: u64, actual: u64 },
    #[error("permission denied: {0}")]
    PermissionDenied(DisabledReason),
    #[error("{0}")]
    Upstream(String),
    /// The batch was cancelled before this item was attempted.
    #[error("cancelled")]
    Cancelled,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for MigrationFailure {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ItemNotFound(_) | StorageError::ShareNotFound(_) => Self::NotFound,
            StorageError::StaleRevision {
                expected, actual, ..
            } => Self::StaleRevision { expected, actual },
            other => Self::Storage(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedItem {
    pub source: ShareId,
    pub item_id: ItemId,
    /// Revision of the item in the destination.
    pub revision: u64,
    /// `false` when the item was already in the destination.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMigration {
    pub source: ShareId,
    pub item_id: ItemId,
    pub error: MigrationFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationOutcome {
    /// Every requested item is in the destination.
    Complete,
    /// Some items moved, some failed.
    Partial,
    /// Nothing moved and at least one item failed.
    Failed,
}

/// Per-item outcome of a batch migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrateItemsResult {
    pub destination: ShareId,
    pub migrated: Vec<MigratedItem>,
    pub failed: Vec<FailedMigration>,
}

impl MigrateItemsResult {
    fn new(destination: ShareId) -> Self {
        Self {
            destination,
            migrated: Vec::new(),
            failed: Vec::new(),
        }
    }

    #[must_use]
    pub fn outcome(&self) -> MigrationOutcome {
        match (self.migrated.is_empty(), self.failed.is_empty()) {
            (_, true) => MigrationOutcome::Complete,
            (false, false) => MigrationOutcome::Partial,
            (true, false) => MigrationOutcome::Failed,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome() == MigrationOutcome::Complete
    }

    /// Number of items actually moved into the destination by this call.
    #[must_use]
    pub fn moved_count(&self) -> usize {
        self.migrated.iter().filter(|item| item.changed).count()
    }

    /// The failed items grouped by source, ready to be passed back to
    /// `migrate_items` for a retry.
    #[must_use]
    pub fn retry_request(&self) -> BTreeMap<ShareId, Vec<ItemId>> {
        let mut request: BTreeMap<ShareId, Vec<ItemId>> = BTreeMap::new();
        for failure in &self.failed {
            request.entry(failure.source).or_default().push(failure.item_id);
        }
        request
    }
}

/// Moves items between vaults.
pub struct MigrationCoordinator {
    store: Arc<dyn ItemStore>,
    access: Arc<dyn AccessProvider>,
    encryption: Arc<dyn EncryptionProvider>,
    tracker: Arc<SyncStatusTracker>,
    config: EngineConfig,
}

impl MigrationCoordinator {
    pub fn new(
        store: Arc<dyn ItemStore>,
        access: Arc<dyn AccessProvider>,
        encryption: Arc<dyn EncryptionProvider>,
        tracker: Arc<SyncStatusTracker>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            access,
            encryption,
            tracker,
            config,
        }
    }

    /// Moves the listed items of each source share into `destination`.
    ///
    /// Fails as a whole only before the first move: with `SyncInProgress`
    /// while a sync covers any involved share, with `ShareNotFound` for an
    /// unknown destination, or with `PermissionDenied` when the destination
    /// is not a vault the user can write to. After that every item is
    /// attempted (until `cancel` fires) and reported individually.
    pub async fn migrate_items(
        &self,
        items: BTreeMap<ShareId, Vec<ItemId>>,
        destination: ShareId,
        cancel: &CancelToken,
    ) -> ItemResult<MigrateItemsResult> {
        self.check_sync_gate(items.keys().chain([&destination]))?;
        self.check_destination(&destination).await?;

        let total: usize = items.values().map(Vec::len).sum();
        info!(
            "Migrating {} items from {} shares into {}",
            total,
            items.len(),
            destination
        );

        let mut result = MigrateItemsResult::new(destination);
        let mut sources: HashMap<ShareId, Result<ShareAccess, MigrationFailure>> = HashMap::new();

        for (source, item_ids) in items {
            for item_id in item_ids {
                if cancel.is_cancelled() {
                    result.failed.push(FailedMigration {
                        source,
                        item_id,
                        error: MigrationFailure::Cancelled,
                    });
                    continue;
                }

                match self
                    .migrate_one(&mut sources, source, item_id, destination)
                    .await
                {
                    Ok(migrated) => result.migrated.push(migrated),
                    Err(error) => {
                        warn!("Failed to migrate item {}/{}: {}", source, item_id, error);
                        result.failed.push(FailedMigration {
                            source,
                            item_id,
                            error,
                        });
                    }
                }
            }
        }

        info!(
            "Migration into {} finished: {} moved, {} already there, {} failed",
            destination,
            result.moved_count(),
            result.migrated.len() - result.moved_count(),
            result.failed.len()
        );
        Ok(result)
    }

    /// Moves every active item of `origin` into `destination`.
    ///
    /// Trashed items stay in `origin`. Partial failure is reported the same
    /// way as for [`migrate_items`](Self::migrate_items); nothing is rolled
    /// back. Deleting the emptied origin is left to the caller.
    pub async fn migrate_vault(
        &self,
        origin: ShareId,
        destination: ShareId,
        cancel: &CancelToken,
    ) -> ItemResult<MigrateItemsResult> {
        self.check_sync_gate([&origin, &destination])?;
        self.access.share_access(&origin).await?;

        let query = ItemQuery::new()
            .in_shares(ShareSelection::Share(origin))
            .in_state(ItemState::Active)
            .including_hidden(true);
        let item_ids: Vec<ItemId> = self
            .store
            .query_items(&query)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();
        debug!("Vault {} has {} active items to migrate", origin, item_ids.len());

        self.migrate_items(BTreeMap::from([(origin, item_ids)]), destination, cancel)
            .await
    }

    fn check_sync_gate<'a>(&self, shares: impl IntoIterator<Item = &'a ShareId>) -> ItemResult<()> {
        if !self.config.block_writes_while_syncing {
            return Ok(());
        }
        let shares: BTreeSet<&ShareId> = shares.into_iter().collect();
        if self.tracker.conflicts_with(shares) {
            warn!("Refusing migration while item sync is running");
            return Err(ItemError::SyncInProgress);
        }
        Ok(())
    }

    async fn check_destination(&self, destination: &ShareId) -> ItemResult<()> {
        let access = self.access.share_access(destination).await?;
        if access.is_item_share() {
            return Err(ItemError::PermissionDenied(DisabledReason::ItemShare));
        }
        if !access.can_write() {
            return Err(ItemError::PermissionDenied(DisabledReason::InsufficientRole));
        }
        Ok(())
    }

    async fn source_access(
        &self,
        sources: &mut HashMap<ShareId, Result<ShareAccess, MigrationFailure>>,
        source: ShareId,
    ) -> Result<ShareAccess, MigrationFailure> {
        if let Some(resolved) = sources.get(&source) {
            return resolved.clone();
        }
        let resolved = match self.access.share_access(&source).await {
            Ok(access) => Ok(access),
            Err(ItemError::ShareNotFound(_)) => Err(MigrationFailure::NotFound),
            Err(e) => Err(MigrationFailure::Upstream(e.to_string())),
        };
        sources.insert(source, resolved.clone());
        resolved
    }

    async fn migrate_one(
        &self,
        sources: &mut HashMap<ShareId, Result<ShareAccess, MigrationFailure>>,
        source: ShareId,
        item_id: ItemId,
        destination: ShareId,
    ) -> Result<MigratedItem, MigrationFailure> {
        let key = ItemKey::new(source, item_id);
        let item = match self.store.get_item(&key).await? {
            Some(item) => item,
            None => return self.already_migrated(source, item_id, destination).await,
        };
        if source == destination {
            return Ok(MigratedItem {
                source,
                item_id,
                revision: item.revision,
                changed: false,
            });
        }

        let access = self.source_access(sources, source).await?;
        if !access.can_write() {
            return Err(MigrationFailure::PermissionDenied(
                DisabledReason::InsufficientRole,
            ));
        }
        if access.is_item_share() {
            return Err(MigrationFailure::PermissionDenied(DisabledReason::ItemShare));
        }
        if item.is_trashed() {
            return Err(MigrationFailure::PermissionDenied(DisabledReason::ItemTrashed));
        }

        let moved = self.rekey(&item, destination)?;
        let revision = moved.revision;
        self.store
            .compare_and_swap(&key, item.revision, moved)
            .await?;
        debug!("Moved item {} from {} to {}", item_id, source, destination);

        Ok(MigratedItem {
            source,
            item_id,
            revision,
            changed: true,
        })
    }

    /// An item missing from its source counts as migrated when it is
    /// already in the destination.
    async fn already_migrated(
        &self,
        source: ShareId,
        item_id: ItemId,
        destination: ShareId,
    ) -> Result<MigratedItem, MigrationFailure> {
        let moved = ItemKey::new(destination, item_id);
        match self.store.get_item(&moved).await? {
            Some(item) => Ok(MigratedItem {
                source,
                item_id,
                revision: item.revision,
                changed: false,
            }),
            None => Err(MigrationFailure::NotFound),
        }
    }

    /// The moved copy of `item`, with its fields re-keyed for `destination`.
    fn rekey(
        &self,
        item: &ItemEncrypted,
        destination: ShareId,
    ) -> Result<ItemEncrypted, MigrationFailure> {
        let reencrypt = |tag: EncryptionTag, blob: &EncryptedBlob| {
            self.encryption
                .reencrypt(&item.share_id, &destination, tag, blob)
                .map_err(|e| MigrationFailure::Upstream(format!("re-encrypt: {e}")))
        };

        let mut moved = item.moved_to(destination);
        moved.title = reencrypt(EncryptionTag::ItemTitle, &item.title)?;
        moved.note = reencrypt(EncryptionTag::ItemNote, &item.note)?;
        moved.content = reencrypt(EncryptionTag::ItemContent, &item.content)?;
        Ok(moved)
    }
}
