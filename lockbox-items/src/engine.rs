//! The item engine: the public face of this crate.

use crate::access::{AccessProvider, StoreAccessProvider};
use crate::actions::{CapabilityEngine, ItemActions};
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::item::Item;
use crate::lifecycle::ItemLifecycle;
use crate::migration::{MigrateItemsResult, MigrationCoordinator};
use crate::{ItemError, ItemResult};
use futures::stream::{BoxStream, StreamExt};
use lockbox_crypto::EncryptionProvider;
use lockbox_storage::{observe_items, ItemQuery, ItemStore};
use lockbox_sync::{
    DownloadedItems, ItemSyncStatusPayload, SyncState, SyncStatusTracker, WatchStream,
};
use lockbox_types::{ItemEncrypted, ItemId, ItemKey, ShareId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Stream of item lists produced by [`ItemEngine::observe_items`].
pub type ItemListStream = BoxStream<'static, ItemResult<Vec<Item>>>;

/// Sync state, capabilities, migration and lifecycle over one item store.
///
/// The engine owns no global state. Build one per session and hand clones
/// of its `Arc` to whatever needs it; the sync driver feeds the tracker
/// returned by [`ItemEngine::tracker`].
pub struct ItemEngine {
    store: Arc<dyn ItemStore>,
    tracker: Arc<SyncStatusTracker>,
    encryption: Arc<dyn EncryptionProvider>,
    capabilities: Arc<CapabilityEngine>,
    migration: MigrationCoordinator,
    lifecycle: ItemLifecycle,
}

impl ItemEngine {
    pub fn new(
        store: Arc<dyn ItemStore>,
        tracker: Arc<SyncStatusTracker>,
        access: Arc<dyn AccessProvider>,
        encryption: Arc<dyn EncryptionProvider>,
        config: EngineConfig,
    ) -> Self {
        let capabilities = Arc::new(CapabilityEngine::new(
            Arc::clone(&store),
            Arc::clone(&access),
        ));
        let lifecycle = ItemLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&capabilities),
            Arc::clone(&tracker),
            config.block_writes_while_syncing,
        );
        let migration = MigrationCoordinator::new(
            Arc::clone(&store),
            access,
            Arc::clone(&encryption),
            Arc::clone(&tracker),
            config,
        );
        Self {
            store,
            tracker,
            encryption,
            capabilities,
            migration,
            lifecycle,
        }
    }

    /// An engine that reads roles from the store's share records, assumes
    /// `config.default_plan` and starts with a fresh tracker.
    pub fn with_store(
        store: Arc<dyn ItemStore>,
        encryption: Arc<dyn EncryptionProvider>,
        config: EngineConfig,
    ) -> Self {
        let access = Arc::new(StoreAccessProvider::new(
            Arc::clone(&store),
            config.default_plan.clone(),
        ));
        Self::new(
            store,
            Arc::new(SyncStatusTracker::default()),
            access,
            encryption,
            config,
        )
    }

    pub fn tracker(&self) -> &Arc<SyncStatusTracker> {
        &self.tracker
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    pub fn encryption(&self) -> &Arc<dyn EncryptionProvider> {
        &self.encryption
    }

    // ── Observation ─────────────────────────────────────────────

    pub fn observe_sync_state(&self) -> WatchStream<SyncState> {
        self.tracker.observe_sync_state()
    }

    pub fn observe_downloaded_items_status(&self) -> WatchStream<DownloadedItems> {
        self.tracker.accumulator().observe_downloaded_items_status()
    }

    pub fn observe_inserted_items_status(&self) -> WatchStream<Option<ItemSyncStatusPayload>> {
        self.tracker.accumulator().observe_inserted_items_status()
    }

    /// Items matching `query`, re-delivered whenever the result changes.
    /// Sensitive fields arrive concealed.
    pub fn observe_items(&self, query: ItemQuery) -> ItemListStream {
        observe_items(Arc::clone(&self.store), query)
            .map(|result| {
                result
                    .map(|items| items.into_iter().map(Item::from).collect())
                    .map_err(ItemError::from)
            })
            .boxed()
    }

    // ── Capabilities ────────────────────────────────────────────

    pub async fn get_item_actions(
        &self,
        share_id: ShareId,
        item_id: ItemId,
    ) -> ItemResult<ItemActions> {
        self.capabilities
            .get_item_actions(&ItemKey::new(share_id, item_id))
            .await
    }

    // ── Migration ───────────────────────────────────────────────

    pub async fn migrate_items(
        &self,
        items: BTreeMap<ShareId, Vec<ItemId>>,
        destination: ShareId,
    ) -> ItemResult<MigrateItemsResult> {
        self.migration
            .migrate_items(items, destination, &CancelToken::new())
            .await
    }

    /// Like [`migrate_items`](Self::migrate_items), stopping between item
    /// moves once `cancel` fires.
    pub async fn migrate_items_cancellable(
        &self,
        items: BTreeMap<ShareId, Vec<ItemId>>,
        destination: ShareId,
        cancel: &CancelToken,
    ) -> ItemResult<MigrateItemsResult> {
        self.migration
            .migrate_items(items, destination, cancel)
            .await
    }

    pub async fn migrate_vault(
        &self,
        origin: ShareId,
        destination: ShareId,
    ) -> ItemResult<MigrateItemsResult> {
        self.migration
            .migrate_vault(origin, destination, &CancelToken::new())
            .await
    }

    pub async fn migrate_vault_cancellable(
        &self,
        origin: ShareId,
        destination: ShareId,
        cancel: &CancelToken,
    ) -> ItemResult<MigrateItemsResult> {
        self.migration
            .migrate_vault(origin, destination, cancel)
            .await
    }

    // ── Lifecycle ───────────────────────────────────────────────

    pub async fn trash_items(&self, keys: &[ItemKey]) -> ItemResult<Vec<ItemEncrypted>> {
        self.lifecycle.trash_items(keys).await
    }

    pub async fn restore_items(&self, keys: &[ItemKey]) -> ItemResult<Vec<ItemEncrypted>> {
        self.lifecycle.restore_items(keys).await
    }

    pub async fn delete_items(&self, keys: &[ItemKey]) -> ItemResult<()> {
        self.lifecycle.delete_items(keys).await
    }

    pub async fn pin_item(&self, key: &ItemKey) -> ItemResult<ItemEncrypted> {
        self.lifecycle.pin_item(key).await
    }

    pub async fn unpin_item(&self, key: &ItemKey) -> ItemResult<ItemEncrypted> {
        self.lifecycle.unpin_item(key).await
    }

    /// Ends the session's sync state.
    pub fn clear(&self) {
        self.tracker.clear();
    }
}
