//! In-memory item store.

use crate::query::listing_order;
use crate::{check_incoming, check_swap, ItemQuery, ItemStore, StorageError, StorageResult};
use async_trait::async_trait;
use lockbox_types::{ItemEncrypted, ItemKey, ShareId, ShareRecord};
use std::collections::{HashMap, HashSet};
use tokio::sync::{watch, RwLock};
use tracing::debug;

#[derive(Default)]
struct Inner {
    shares: HashMap<ShareId, ShareRecord>,
    items: HashMap<ItemKey, ItemEncrypted>,
}

impl Inner {
    fn hidden_shares(&self) -> HashSet<ShareId> {
        self.shares
            .values()
            .filter(|share| share.hidden)
            .map(|share| share.share_id)
            .collect()
    }
}

/// Item store kept entirely in process memory.
pub struct MemoryItemStore {
    inner: RwLock<Inner>,
    changes: watch::Sender<u64>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            changes: watch::Sender::new(0),
        }
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

impl Default for MemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn upsert_share(&self, share: ShareRecord) -> StorageResult<()> {
        self.inner.write().await.shares.insert(share.share_id, share);
        self.notify();
        Ok(())
    }

    async fn get_share(&self, share_id: &ShareId) -> StorageResult<Option<ShareRecord>> {
        Ok(self.inner.read().await.shares.get(share_id).cloned())
    }

    async fn shares(&self) -> StorageResult<Vec<ShareRecord>> {
        Ok(self.inner.read().await.shares.values().cloned().collect())
    }

    async fn remove_share(&self, share_id: &ShareId) -> StorageResult<usize> {
        let removed = {
            let mut inner = self.inner.write().await;
            inner.shares.remove(share_id);
            let before = inner.items.len();
            inner.items.retain(|_, item| item.share_id != *share_id);
            before - inner.items.len()
        };
        debug!("Removed share {} with {} items", share_id, removed);
        self.notify();
        Ok(removed)
    }

    async fn upsert_items(&self, items: Vec<ItemEncrypted>) -> StorageResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        {
            let mut inner = self.inner.write().await;
            for item in &items {
                check_incoming(inner.items.get(&item.key()), item)?;
            }
            for item in items {
                inner.items.insert(item.key(), item);
            }
        }
        self.notify();
        Ok(())
    }

    async fn get_item(&self, key: &ItemKey) -> StorageResult<Option<ItemEncrypted>> {
        Ok(self.inner.read().await.items.get(key).cloned())
    }

    async fn query_items(&self, query: &ItemQuery) -> StorageResult<Vec<ItemEncrypted>> {
        let inner = self.inner.read().await;
        let hidden = inner.hidden_shares();
        let mut items: Vec<ItemEncrypted> = inner
            .items
            .values()
            .filter(|item| query.matches(item, &hidden))
            .cloned()
            .collect();
        items.sort_by(listing_order);
        Ok(items)
    }

    async fn compare_and_swap(
        &self,
        key: &ItemKey,
        expected_revision: u64,
        updated: ItemEncrypted,
    ) -> StorageResult<()> {
        {
            let mut inner = self.inner.write().await;
            let target = updated.key();
            let checked = check_swap(key, inner.items.get(key), expected_revision, Some(&updated))
                .and_then(|()| {
                    if target != *key && inner.items.contains_key(&target) {
                        return Err(StorageError::ItemExists(target));
                    }
                    Ok(())
                });
            if let Err(e) = checked {
                debug!("Rejected write to {}: {}", key, e);
                return Err(e);
            }
            inner.items.remove(key);
            inner.items.insert(target, updated);
        }
        self.notify();
        Ok(())
    }

    async fn delete_item(&self, key: &ItemKey, expected_revision: u64) -> StorageResult<()> {
        {
            let mut inner = self.inner.write().await;
            check_swap(key, inner.items.get(key), expected_revision, None)?;
            inner.items.remove(key);
        }
        self.notify();
        Ok(())
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
