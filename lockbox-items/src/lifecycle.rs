//! Trash, restore, delete and pin.
//!
//! Every operation is refused with `SyncInProgress` while a running sync
//! still covers the item's share. It then derives the item's actions and
//! refuses with `PermissionDenied` when the action is not available. State
//! changes are committed through compare-and-swap with a bumped revision;
//! only [`ItemLifecycle::delete_item`] removes an item.

use crate::actions::{CapabilityEngine, DisabledReason, ResolvedItem};
use crate::{ItemError, ItemResult};
use lockbox_storage::ItemStore;
use lockbox_sync::SyncStatusTracker;
use lockbox_types::{ItemEncrypted, ItemKey, ItemState, Timestamp};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ItemLifecycle {
    store: Arc<dyn ItemStore>,
    capabilities: Arc<CapabilityEngine>,
    tracker: Arc<SyncStatusTracker>,
    block_while_syncing: bool,
}

impl ItemLifecycle {
    pub fn new(
        store: Arc<dyn ItemStore>,
        capabilities: Arc<CapabilityEngine>,
        tracker: Arc<SyncStatusTracker>,
        block_while_syncing: bool,
    ) -> Self {
        Self {
            store,
            capabilities,
            tracker,
            block_while_syncing,
        }
    }

    /// Moves an active item to the trash.
    pub async fn trash_item(&self, key: &ItemKey) -> ItemResult<ItemEncrypted> {
        let resolved = self.resolve_for_write(key).await?;
        resolved.actions.trash_status(&resolved.access).check()?;
        self.commit(resolved.item, |item| item.state = ItemState::Trashed)
            .await
    }

    /// Brings a trashed item back.
    pub async fn restore_item(&self, key: &ItemKey) -> ItemResult<ItemEncrypted> {
        let resolved = self.resolve_for_write(key).await?;
        resolved.actions.restore_status(&resolved.access).check()?;
        self.commit(resolved.item, |item| item.state = ItemState::Active)
            .await
    }

    /// Permanently deletes a trashed item.
    pub async fn delete_item(&self, key: &ItemKey) -> ItemResult<()> {
        let resolved = self.resolve_for_write(key).await?;
        resolved.actions.delete_status(&resolved.access).check()?;
        self.store
            .delete_item(key, resolved.item.revision)
            .await?;
        debug!("Deleted item {}", key);
        Ok(())
    }

    /// Pins an active item. Pinning is allowed for every role; pinning an
    /// already pinned item changes nothing.
    pub async fn pin_item(&self, key: &ItemKey) -> ItemResult<ItemEncrypted> {
        self.set_pinned(key, true).await
    }

    pub async fn unpin_item(&self, key: &ItemKey) -> ItemResult<ItemEncrypted> {
        self.set_pinned(key, false).await
    }

    /// Trashes each item in order, stopping at the first failure. Items
    /// before the failing one stay trashed.
    pub async fn trash_items(&self, keys: &[ItemKey]) -> ItemResult<Vec<ItemEncrypted>> {
        let mut updated = Vec::with_capacity(keys.len());
        for key in keys {
            updated.push(self.trash_item(key).await?);
        }
        Ok(updated)
    }

    pub async fn restore_items(&self, keys: &[ItemKey]) -> ItemResult<Vec<ItemEncrypted>> {
        let mut updated = Vec::with_capacity(keys.len());
        for key in keys {
            updated.push(self.restore_item(key).await?);
        }
        Ok(updated)
    }

    pub async fn delete_items(&self, keys: &[ItemKey]) -> ItemResult<()> {
        for key in keys {
            self.delete_item(key).await?;
        }
        Ok(())
    }

    async fn set_pinned(&self, key: &ItemKey, pinned: bool) -> ItemResult<ItemEncrypted> {
        let resolved = self.resolve_for_write(key).await?;
        if resolved.item.is_trashed() {
            return Err(ItemError::PermissionDenied(DisabledReason::ItemTrashed));
        }
        if resolved.item.is_pinned == pinned {
            return Ok(resolved.item);
        }
        self.commit(resolved.item, |item| {
            item.is_pinned = pinned;
            item.pin_time = pinned.then(Timestamp::now);
        })
        .await
    }

    async fn resolve_for_write(&self, key: &ItemKey) -> ItemResult<ResolvedItem> {
        if self.block_while_syncing && self.tracker.conflicts_with([&key.share_id]) {
            warn!("Refusing write to {} while item sync is running", key);
            return Err(ItemError::SyncInProgress);
        }
        self.capabilities.resolve(key).await
    }

    async fn commit(
        &self,
        current: ItemEncrypted,
        change: impl FnOnce(&mut ItemEncrypted),
    ) -> ItemResult<ItemEncrypted> {
        let mut updated = current.next_revision();
        change(&mut updated);
        self.store
            .compare_and_swap(&current.key(), current.revision, updated.clone())
            .await?;
        debug!("Item {} now at revision {}", updated.key(), updated.revision);
        Ok(updated)
    }
}
