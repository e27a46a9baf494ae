//! Per-share progress of the running sync.

use crate::stream::{watch_stream, WatchStream};
use crate::ItemSyncStatusPayload;
use lockbox_types::ShareId;
use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::debug;

/// Aggregate download counters of one sync, keyed by share.
pub type DownloadedItems = BTreeMap<ShareId, ItemSyncStatusPayload>;

/// Broadcast point for sync progress.
///
/// The accumulator does not merge. The driver reads the current aggregate,
/// merges its new counters (see [`ItemSyncStatusPayload::merge_into`]) and
/// publishes the result with [`emit_accumulated`](Self::emit_accumulated).
pub struct PerShareSyncAccumulator {
    downloaded: watch::Sender<DownloadedItems>,
    inserted: watch::Sender<Option<ItemSyncStatusPayload>>,
}

impl PerShareSyncAccumulator {
    pub fn new() -> Self {
        Self {
            downloaded: watch::Sender::new(DownloadedItems::new()),
            inserted: watch::Sender::new(None),
        }
    }

    /// Replaces the full aggregate.
    pub fn emit_accumulated(&self, aggregate: DownloadedItems) {
        debug!("Sync progress for {} shares", aggregate.len());
        self.downloaded.send_replace(aggregate);
    }

    /// Publishes a newly-inserted-items notification, overwriting any that
    /// has not been seen yet.
    pub fn emit_inserted(&self, payload: ItemSyncStatusPayload) {
        self.inserted.send_replace(Some(payload));
    }

    /// The current aggregate.
    pub fn downloaded(&self) -> DownloadedItems {
        self.downloaded.borrow().clone()
    }

    pub fn last_inserted(&self) -> Option<ItemSyncStatusPayload> {
        *self.inserted.borrow()
    }

    /// Whether `share_id` has reported a complete download in this sync.
    pub fn is_share_complete(&self, share_id: &ShareId) -> bool {
        self.downloaded
            .borrow()
            .get(share_id)
            .is_some_and(ItemSyncStatusPayload::is_complete)
    }

    pub fn subscribe_downloaded(&self) -> watch::Receiver<DownloadedItems> {
        self.downloaded.subscribe()
    }

    pub fn observe_downloaded_items_status(&self) -> WatchStream<DownloadedItems> {
        watch_stream(self.downloaded.subscribe())
    }

    pub fn observe_inserted_items_status(&self) -> WatchStream<Option<ItemSyncStatusPayload>> {
        watch_stream(self.inserted.subscribe())
    }

    /// Discards the aggregate and any pending inserted-items notification.
    pub fn clear(&self) {
        self.downloaded.send_replace(DownloadedItems::new());
        self.inserted.send_replace(None);
    }
}

impl Default for PerShareSyncAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
